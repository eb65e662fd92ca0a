//! Target types and the target key of a log entry
//!
//! Every trackable element kind has a stable small-integer code. The codes are
//! persisted in every log entry, so a code must never be reassigned: doing so
//! would silently re-point historical entries at a different kind of element.
//! New kinds get new codes and bump [`TARGET_TYPE_TABLE_VERSION`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::ElementId;
use crate::error::PartLogError;

/// Version of [`TARGET_TYPE_TABLE`]
pub const TARGET_TYPE_TABLE_VERSION: u32 = 1;

/// Kinds of elements whose mutations are tracked in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TargetType {
    User,
    Attachment,
    Part,
    Category,
    Footprint,
    Manufacturer,
    StorageLocation,
    Supplier,
    Group,
    AttachmentType,
    Currency,
    MeasurementUnit,
    PartLot,
    Project,
    Orderdetail,
    Pricedetail,
    Parameter,
    LabelProfile,
}

/// The code table: `(kind, code, name)`. Read-only, fixed at compile time.
pub const TARGET_TYPE_TABLE: [(TargetType, u8, &str); 18] = [
    (TargetType::User, 1, "user"),
    (TargetType::Attachment, 2, "attachment"),
    (TargetType::Part, 3, "part"),
    (TargetType::Category, 4, "category"),
    (TargetType::Footprint, 5, "footprint"),
    (TargetType::Manufacturer, 6, "manufacturer"),
    (TargetType::StorageLocation, 7, "storage_location"),
    (TargetType::Supplier, 8, "supplier"),
    (TargetType::Group, 9, "group"),
    (TargetType::AttachmentType, 10, "attachment_type"),
    (TargetType::Currency, 11, "currency"),
    (TargetType::MeasurementUnit, 12, "measurement_unit"),
    (TargetType::PartLot, 13, "part_lot"),
    (TargetType::Project, 14, "project"),
    (TargetType::Orderdetail, 15, "orderdetail"),
    (TargetType::Pricedetail, 16, "pricedetail"),
    (TargetType::Parameter, 17, "parameter"),
    (TargetType::LabelProfile, 18, "label_profile"),
];

impl TargetType {
    fn row(self) -> &'static (TargetType, u8, &'static str) {
        // Rows are listed in declaration order
        &TARGET_TYPE_TABLE[self as usize]
    }

    /// The persisted code of this kind
    pub fn code(self) -> u8 {
        self.row().1
    }

    /// The snake_case name of this kind
    pub fn as_str(self) -> &'static str {
        self.row().2
    }

    /// Look up a kind by its persisted code
    pub fn from_code(code: u8) -> Result<Self, PartLogError> {
        TARGET_TYPE_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(kind, _, _)| *kind)
            .ok_or_else(|| {
                PartLogError::InvalidArgument(format!("unmapped target type code {}", code))
            })
    }

    /// All kinds in code order
    pub fn all() -> impl Iterator<Item = TargetType> {
        TARGET_TYPE_TABLE.iter().map(|(kind, _, _)| *kind)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = PartLogError;

    /// Parse from either the name ("part", "Part", "storage-location") or the code ("3")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code);
        }

        let normalized = s.to_lowercase().replace('-', "_");
        TARGET_TYPE_TABLE
            .iter()
            .find(|(_, _, name)| *name == normalized)
            .map(|(kind, _, _)| *kind)
            .ok_or_else(|| PartLogError::InvalidArgument(format!("unmapped target type '{}'", s)))
    }
}

impl From<TargetType> for u8 {
    fn from(kind: TargetType) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for TargetType {
    type Error = PartLogError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

/// The element a log entry is about
///
/// This is a lookup key, not an owning reference: the element it names may
/// have been deleted since the entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub target_type: TargetType,
    pub id: ElementId,
}

impl Target {
    pub fn new(target_type: TargetType, id: impl Into<ElementId>) -> Self {
        Self {
            target_type,
            id: id.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target_type, self.id)
    }
}
