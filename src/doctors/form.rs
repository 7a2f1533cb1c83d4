use std::path::Path;

use crate::{media::{self, MultipartForm, Upload}, res, AppError, AppResult};

use super::{Doctor, DoctorFields};

/// Raw profile form input, kept as typed so it can be echoed back on error.
#[derive(Debug, Default, Clone)]
pub(crate) struct DoctorForm {
    pub name: String,
    pub specialty: String,
    pub clinic_address: String,
    pub experience_years: String,
    pub bio: String,
}

fn bounded(label: &str, value: &str, max: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{label} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::validation(format!("{label} must be at most {max} characters")));
    }
    Ok(value.to_owned())
}

impl DoctorForm {
    pub(crate) fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name"),
            specialty: form.text("specialty"),
            clinic_address: form.text("clinic_address"),
            experience_years: form.text("experience_years"),
            bio: form.text("bio"),
        }
    }

    pub(crate) fn validate(&self) -> AppResult<DoctorFields> {
        let experience_years = self
            .experience_years
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|years| (0..=100).contains(years))
            .ok_or_else(|| AppError::validation("years of experience must be a whole number between 0 and 100"))?;

        let bio = self.bio.trim();
        if bio.is_empty() {
            return Err(AppError::validation("biography is required"));
        }

        Ok(DoctorFields {
            name: bounded("name", &self.name, 100)?,
            specialty: bounded("specialty", &self.specialty, 100)?,
            clinic_address: bounded("clinic address", &self.clinic_address, 200)?,
            experience_years,
            bio: bio.to_owned(),
            photo: None,
        })
    }

    /// Validates the text fields, then stores the photo if one came along.
    pub(crate) async fn into_fields(&self, media_root: &Path, photo: Option<Upload>) -> AppResult<DoctorFields> {
        let mut fields = self.validate()?;
        if let Some(photo) = photo {
            fields.photo = Some(media::store_photo(media_root, &photo).await?);
        }
        Ok(fields)
    }

    pub(crate) fn render(&self, title: &str, action: &str, error: Option<&str>) -> String {
        crate::include_res!(str, "/pages/doctor_form.html")
            .replace("{title}", title)
            .replace("{action}", action)
            .replace("{error}", &res::error_banner(error))
            .replace("{name}", &res::escape(&self.name))
            .replace("{specialty}", &res::escape(&self.specialty))
            .replace("{clinic_address}", &res::escape(&self.clinic_address))
            .replace("{experience_years}", &res::escape(&self.experience_years))
            .replace("{bio}", &res::escape(&self.bio))
    }
}

impl From<&Doctor> for DoctorForm {
    fn from(doctor: &Doctor) -> Self {
        Self {
            name: doctor.name.clone(),
            specialty: doctor.specialty.clone(),
            clinic_address: doctor.clinic_address.clone(),
            experience_years: doctor.experience_years.to_string(),
            bio: doctor.bio.clone(),
        }
    }
}
