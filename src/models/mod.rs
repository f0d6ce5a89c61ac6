//! Models module for the configuration SDK
//!
//! Defines the portable configuration document and the option and result
//! values that travel with every export and import call.

pub mod document;
pub mod options;
pub mod results;
pub mod section;

pub use document::{
    ConfigurationDocument, Dataset, EntityDescriptor, EntityId, EntityMap, GeneralSection,
    ObjectMapping, Point3, PropertyBag,
};
pub use options::{ConfigurationOptions, ConfigurationOptionsBuilder};
pub use results::{EntityOutcome, EntityReport, ImportResults};
pub use section::Section;
