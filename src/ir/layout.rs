use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::best_suggestion;

/// Semantic tensor axis. `I`/`O` are the kernel's input and output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    N,
    C,
    H,
    W,
    I,
    O,
}

impl Axis {
    pub fn letter(self) -> char {
        match self {
            Axis::N => 'N',
            Axis::C => 'C',
            Axis::H => 'H',
            Axis::W => 'W',
            Axis::I => 'I',
            Axis::O => 'O',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'N' => Some(Axis::N),
            'C' => Some(Axis::C),
            'H' => Some(Axis::H),
            'W' => Some(Axis::W),
            'I' => Some(Axis::I),
            'O' => Some(Axis::O),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseLayout {
    Nchw,
    Nhwc,
    Oihw,
    Hwio,
    Hwoi,
}

impl BaseLayout {
    pub const ALL: [BaseLayout; 5] = [
        BaseLayout::Nchw,
        BaseLayout::Nhwc,
        BaseLayout::Oihw,
        BaseLayout::Hwio,
        BaseLayout::Hwoi,
    ];

    pub const NAMES: [&'static str; 5] = ["NCHW", "NHWC", "OIHW", "HWIO", "HWOI"];

    pub fn axes(self) -> [Axis; 4] {
        match self {
            BaseLayout::Nchw => [Axis::N, Axis::C, Axis::H, Axis::W],
            BaseLayout::Nhwc => [Axis::N, Axis::H, Axis::W, Axis::C],
            BaseLayout::Oihw => [Axis::O, Axis::I, Axis::H, Axis::W],
            BaseLayout::Hwio => [Axis::H, Axis::W, Axis::I, Axis::O],
            BaseLayout::Hwoi => [Axis::H, Axis::W, Axis::O, Axis::I],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BaseLayout::Nchw => "NCHW",
            BaseLayout::Nhwc => "NHWC",
            BaseLayout::Oihw => "OIHW",
            BaseLayout::Hwio => "HWIO",
            BaseLayout::Hwoi => "HWOI",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|base| base.as_str() == name)
    }

    pub fn position(self, axis: Axis) -> Option<usize> {
        self.axes().iter().position(|candidate| *candidate == axis)
    }

    /// Extent of `axis` in a rank-4 shape laid out in this base order.
    pub fn extent(self, dims: [usize; 4], axis: Axis) -> Option<usize> {
        self.position(axis).map(|index| dims[index])
    }

    pub fn is_data_layout(self) -> bool {
        matches!(self, BaseLayout::Nchw | BaseLayout::Nhwc)
    }
}

impl fmt::Display for BaseLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisBlock {
    pub axis: Axis,
    pub size: usize,
}

/// A base axis ordering with at most one axis split into an inner block.
///
/// Only well-formed tags can be constructed: the blocked axis belongs to the
/// base and the block size is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayoutTag {
    base: BaseLayout,
    block: Option<AxisBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LayoutError {
    pub message: String,
    pub hint: Option<String>,
}

impl LayoutError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
        }
    }
}

impl LayoutTag {
    pub fn plain(base: BaseLayout) -> Self {
        Self { base, block: None }
    }

    pub fn blocked(base: BaseLayout, axis: Axis, size: usize) -> Result<Self, LayoutError> {
        if size == 0 {
            return Err(LayoutError::new(format!(
                "block size for {base} must be positive"
            )));
        }
        if base.position(axis).is_none() {
            return Err(LayoutError::new(format!(
                "axis '{}' is not part of base layout {base}",
                axis.letter()
            )));
        }
        Ok(Self {
            base,
            block: Some(AxisBlock { axis, size }),
        })
    }

    pub fn base(&self) -> BaseLayout {
        self.base
    }

    pub fn block(&self) -> Option<AxisBlock> {
        self.block
    }

    pub fn is_blocked(&self) -> bool {
        self.block.is_some()
    }

    pub fn rank(&self) -> usize {
        if self.is_blocked() { 5 } else { 4 }
    }

    /// Lays out logical `dims` (in base order) under this tag. The blocked
    /// axis keeps `extent / size` (truncating) and the block is appended.
    pub fn shape_for(&self, dims: [usize; 4]) -> Vec<usize> {
        let mut shape = dims.to_vec();
        if let Some(block) = self.block
            && let Some(index) = self.base.position(block.axis)
        {
            shape[index] /= block.size;
            shape.push(block.size);
        }
        shape
    }
}

impl fmt::Display for LayoutTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str())?;
        if let Some(block) = self.block {
            write!(
                f,
                "{}{}",
                block.size,
                block.axis.letter().to_ascii_lowercase()
            )?;
        }
        Ok(())
    }
}

impl FromStr for LayoutTag {
    type Err = LayoutError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let split = text
            .find(|ch: char| ch.is_ascii_digit())
            .unwrap_or(text.len());
        let (prefix, suffix) = text.split_at(split);

        let Some(base) = BaseLayout::from_name(prefix) else {
            let mut err = LayoutError::new(format!("unknown base layout '{prefix}' in '{text}'"));
            err.hint = best_suggestion(prefix, &BaseLayout::NAMES)
                .map(|candidate| format!("did you mean '{candidate}'?"));
            return Err(err);
        };
        if suffix.is_empty() {
            return Ok(Self::plain(base));
        }

        let letter_at = suffix
            .find(|ch: char| !ch.is_ascii_digit())
            .ok_or_else(|| LayoutError::new(format!("layout '{text}' is missing a block axis")))?;
        let (digits, rest) = suffix.split_at(letter_at);

        let mut letters = rest.chars();
        let letter = match (letters.next(), letters.next()) {
            (Some(letter), None) if letter.is_ascii_lowercase() => letter,
            _ => {
                return Err(LayoutError::new(format!(
                    "layout '{text}' must end in a single lowercase axis letter"
                )));
            }
        };

        let size = digits.parse::<usize>().map_err(|err| {
            LayoutError::new(format!("invalid block size '{digits}' in '{text}': {err}"))
        })?;
        let axis = Axis::from_letter(letter.to_ascii_uppercase())
            .filter(|axis| base.position(*axis).is_some())
            .ok_or_else(|| {
                LayoutError::new(format!(
                    "block axis '{letter}' in '{text}' is not an axis of {base}"
                ))
            })?;

        Self::blocked(base, axis, size)
    }
}

impl TryFrom<String> for LayoutTag {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LayoutTag> for String {
    fn from(tag: LayoutTag) -> Self {
        tag.to_string()
    }
}

/// Accepts any block size on a fixed base and blocked axis, e.g. `NCHW<n>c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPattern {
    pub base: BaseLayout,
    pub axis: Axis,
}

pub const NCHW_C: LayoutPattern = LayoutPattern::new(BaseLayout::Nchw, Axis::C);
pub const OIHW_O: LayoutPattern = LayoutPattern::new(BaseLayout::Oihw, Axis::O);
pub const NHWC_C: LayoutPattern = LayoutPattern::new(BaseLayout::Nhwc, Axis::C);
pub const HWIO_O: LayoutPattern = LayoutPattern::new(BaseLayout::Hwio, Axis::O);
pub const HWOI_O: LayoutPattern = LayoutPattern::new(BaseLayout::Hwoi, Axis::O);

impl LayoutPattern {
    pub const fn new(base: BaseLayout, axis: Axis) -> Self {
        Self { base, axis }
    }

    pub fn matches(&self, tag: &LayoutTag) -> bool {
        tag.base == self.base && tag.block.map(|block| block.axis) == Some(self.axis)
    }

    pub fn with_block(&self, size: usize) -> Result<LayoutTag, LayoutError> {
        LayoutTag::blocked(self.base, self.axis, size)
    }
}

impl fmt::Display for LayoutPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}<n>{}",
            self.base,
            self.axis.letter().to_ascii_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> LayoutTag {
        text.parse().expect("layout should parse")
    }

    #[test]
    fn accepts_blocked_tags_of_each_family() {
        assert!(NCHW_C.matches(&tag("NCHW4c")));
        assert!(OIHW_O.matches(&tag("OIHW4o")));
        assert!(HWIO_O.matches(&tag("HWIO4o")));
        assert!(HWOI_O.matches(&tag("HWOI4o")));
        assert!(NHWC_C.matches(&tag("NHWC16c")));
    }

    #[test]
    fn rejects_unknown_axis_and_zero_block() {
        assert!("NCHW5x".parse::<LayoutTag>().is_err());
        assert!("NCHW0c".parse::<LayoutTag>().is_err());
        assert!("NCHW4o".parse::<LayoutTag>().is_err());
        assert!("NCHW4".parse::<LayoutTag>().is_err());
        assert!("NCHW4cc".parse::<LayoutTag>().is_err());
        assert!("NCHW4C".parse::<LayoutTag>().is_err());
    }

    #[test]
    fn base_mismatch_is_not_matched() {
        assert!(!NCHW_C.matches(&tag("NHWC4c")));
        assert!(!OIHW_O.matches(&tag("OIHW4i")));
        assert!(!NCHW_C.matches(&tag("NCHW")));
    }

    #[test]
    fn unknown_base_suggests_closest_name() {
        let err = "NCWH4c".parse::<LayoutTag>().expect_err("NCWH is not a base");
        assert!(err.message.contains("NCWH"));
        assert!(err.hint.is_some());
    }

    #[test]
    fn shape_for_splits_the_blocked_axis() {
        assert_eq!(tag("NCHW4c").shape_for([1, 16, 32, 32]), vec![1, 4, 32, 32, 4]);
        assert_eq!(tag("OIHW4o").shape_for([32, 16, 3, 3]), vec![8, 16, 3, 3, 4]);
        assert_eq!(tag("HWOI4o").shape_for([3, 3, 32, 16]), vec![3, 3, 8, 16, 4]);
        assert_eq!(tag("NHWC").shape_for([1, 8, 8, 3]), vec![1, 8, 8, 3]);
    }

    #[test]
    fn serde_uses_the_textual_form() {
        let json = serde_json::to_string(&tag("HWIO4o")).expect("serialize");
        assert_eq!(json, "\"HWIO4o\"");
        let parsed: LayoutTag = serde_json::from_str("\"NHWC4c\"").expect("deserialize");
        assert_eq!(parsed, tag("NHWC4c"));
        assert!(serde_json::from_str::<LayoutTag>("\"NCHW5x\"").is_err());
    }
}
