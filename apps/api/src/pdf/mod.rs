// Offer letter PDF: layout composition here, typesetting in an external service,
// optional S3 archive of the rendered bytes.

pub mod archive;
pub mod document;
pub mod renderer;

pub use archive::PdfArchive;
pub use renderer::{HttpPdfRenderer, PdfRenderer};
