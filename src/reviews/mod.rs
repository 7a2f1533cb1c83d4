mod form;
pub mod store;

pub(crate) use form::ReviewForm;
pub use store::{NewReview, Review};
