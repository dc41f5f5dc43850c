// folio-common: shared types, diff algebra and tree path rules for the Folio workspace

pub mod diff;
pub mod path;
pub mod types;
pub mod window;
