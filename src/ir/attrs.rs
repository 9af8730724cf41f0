use serde::{Deserialize, Serialize};

use crate::ir::{BaseLayout, DataType, LayoutTag};

/// Attributes of a 2D convolution node.
///
/// The pass never edits a caller's attributes. Rewrites derive a fresh value
/// through [`Conv2dAttrs::with_overrides`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conv2dAttrs {
    #[serde(default = "unit_pair")]
    pub strides: [usize; 2],
    /// `[top, left, bottom, right]`.
    #[serde(default)]
    pub padding: [usize; 4],
    #[serde(default = "unit_pair")]
    pub dilation: [usize; 2],
    #[serde(default = "one")]
    pub groups: usize,
    #[serde(default)]
    pub channels: Option<usize>,
    #[serde(default)]
    pub kernel_size: Option<[usize; 2]>,
    pub data_layout: LayoutTag,
    pub kernel_layout: LayoutTag,
    /// `None` means the output uses `data_layout`.
    #[serde(default)]
    pub out_layout: Option<LayoutTag>,
    #[serde(default)]
    pub out_dtype: Option<DataType>,
    #[serde(default)]
    pub tile_size: Option<usize>,
}

fn unit_pair() -> [usize; 2] {
    [1, 1]
}

fn one() -> usize {
    1
}

impl Conv2dAttrs {
    pub fn new(data_layout: LayoutTag, kernel_layout: LayoutTag) -> Self {
        Self {
            strides: unit_pair(),
            padding: [0; 4],
            dilation: unit_pair(),
            groups: one(),
            channels: None,
            kernel_size: None,
            data_layout,
            kernel_layout,
            out_layout: None,
            out_dtype: None,
            tile_size: None,
        }
    }

    pub fn nchw() -> Self {
        Self::new(
            LayoutTag::plain(BaseLayout::Nchw),
            LayoutTag::plain(BaseLayout::Oihw),
        )
    }

    pub fn nhwc(kernel: BaseLayout) -> Self {
        Self::new(LayoutTag::plain(BaseLayout::Nhwc), LayoutTag::plain(kernel))
    }

    pub fn effective_out_layout(&self) -> LayoutTag {
        self.out_layout.unwrap_or(self.data_layout)
    }

    pub fn is_dilated(&self) -> bool {
        self.dilation != [1, 1]
    }

    pub fn with_overrides(&self, overrides: AttrOverrides) -> Self {
        let mut next = self.clone();
        if let Some(channels) = overrides.channels {
            next.channels = Some(channels);
        }
        if let Some(tile_size) = overrides.tile_size {
            next.tile_size = Some(tile_size);
        }
        if let Some(layout) = overrides.data_layout {
            next.data_layout = layout;
        }
        if let Some(layout) = overrides.kernel_layout {
            next.kernel_layout = layout;
        }
        if let Some(layout) = overrides.out_layout {
            next.out_layout = Some(layout);
        }
        next
    }
}

/// Explicit set of attribute replacements applied by a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrOverrides {
    channels: Option<usize>,
    tile_size: Option<usize>,
    data_layout: Option<LayoutTag>,
    kernel_layout: Option<LayoutTag>,
    out_layout: Option<LayoutTag>,
}

impl AttrOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    #[must_use]
    pub fn tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = Some(tile_size);
        self
    }

    #[must_use]
    pub fn layouts(mut self, data: LayoutTag, kernel: LayoutTag, out: LayoutTag) -> Self {
        self.data_layout = Some(data);
        self.kernel_layout = Some(kernel);
        self.out_layout = Some(out);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_leave_the_source_untouched() {
        let original = Conv2dAttrs::nchw();
        let blocked: LayoutTag = "NCHW4c".parse().expect("layout");
        let kernel: LayoutTag = "OIHW4o".parse().expect("layout");

        let next = original.with_overrides(
            AttrOverrides::new()
                .channels(32)
                .layouts(blocked, kernel, blocked),
        );

        assert_eq!(original, Conv2dAttrs::nchw());
        assert_eq!(next.channels, Some(32));
        assert_eq!(next.data_layout, blocked);
        assert_eq!(next.effective_out_layout(), blocked);
        assert_eq!(next.strides, original.strides);
        assert_eq!(next.tile_size, None);
    }

    #[test]
    fn deserializes_with_defaults() {
        let attrs: Conv2dAttrs = serde_json::from_str(
            r#"{"data_layout": "NHWC", "kernel_layout": "HWOI", "dilation": [2, 2]}"#,
        )
        .expect("attrs should deserialize");

        assert_eq!(attrs.strides, [1, 1]);
        assert_eq!(attrs.groups, 1);
        assert!(attrs.is_dilated());
        assert_eq!(attrs.kernel_layout.base(), BaseLayout::Hwoi);
    }
}
