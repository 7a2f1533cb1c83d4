mod edit;
mod form;
mod list;
mod page;
mod register;
pub mod store;

use axum::{routing::get, Router};

use crate::{include_res, media, res, AppState};

pub use store::{Doctor, DoctorFields};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::home))
        .route("/register/", get(register::register_page).post(register::register))
        .route("/doctor/edit/", get(edit::edit_page).post(edit::edit))
        .route("/doctor/{id}/", get(page::profile).post(page::review))
}

pub(crate) fn doctor_item_html(doctor: &Doctor) -> String {
    include_res!(str, "/pages/doctor_item.html")
        .replace("{id}", &doctor.id.to_string())
        .replace("{photo_url}", &res::escape(&media::url(&doctor.photo)))
        .replace("{specialty}", &res::escape(&doctor.specialty))
        .replace("{clinic_address}", &res::escape(&doctor.clinic_address))
        .replace("{name}", &res::escape(&doctor.name))
}
