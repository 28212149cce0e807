pub mod prescription;

pub use prescription::{
    PrescriptionItem, PrescriptionItemInput, PrescriptionItemView, PrescriptionRequest,
    PrescriptionStatus, PrescriptionView, ReviewRequest, SubmitPrescriptionRequest,
};
