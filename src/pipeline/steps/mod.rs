// One executor per step. Each reads its predecessor's output fresh from the
// job document, does its work, and persists `step{N}_output`.

pub mod llm_helper;

#[path = "01_acquisition.rs"]
pub mod acquisition;
#[path = "02_products.rs"]
pub mod products;
#[path = "03_parts.rs"]
pub mod parts;
#[path = "04_document.rs"]
pub mod document;

pub use acquisition::AcquisitionStep;
pub use document::DocumentGenerationStep;
pub use parts::PartsBreakdownStep;
pub use products::ProductIdentificationStep;
