//! Reference scanning over the site document.
//!
//! References between the document and the blob/icon collections are
//! conventions, not constraints: any field named `image`, `images`, `url` or
//! `file` may name a blob, and any field named `iconId` names an icon. The
//! scanners here walk arbitrary JSON trees to find them. Everything is pure;
//! callers supply the tree and, for audits, the set of things that exist.

mod walk;

pub mod icons;
pub mod images;

pub use icons::{
    audit_icons, find_document_icon_references, find_icon_references, IconAudit, IconReference,
};
pub use images::{
    audit_images, audit_images_under, extract_blob_filenames, extract_blob_filenames_under,
    find_blob_references_under, find_image_references, BlobReference, ImageAudit, ImageKey,
    ImageReference, IMAGE_EXTENSIONS,
};
