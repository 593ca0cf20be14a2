// PDF composition: the lopdf-backed output document, the paginating composer,
// the merger that appends uploaded documents, and tolerant loading for them.

pub mod composer;
pub mod document;
pub mod merger;
pub mod recovery;

#[cfg(test)]
pub mod testing;

pub use composer::Composer;
pub use merger::embed;
