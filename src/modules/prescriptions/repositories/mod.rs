pub mod prescription_repository;

pub use prescription_repository::PrescriptionRepository;
