mod cards;
mod companies;
mod ocr_jobs;

pub use cards::CardRepository;
pub use companies::CompanyRepository;
pub use ocr_jobs::OcrJobRepository;
