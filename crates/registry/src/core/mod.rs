mod priority;
mod tag;

pub use priority::Priority;
pub use tag::ExtensionTag;
