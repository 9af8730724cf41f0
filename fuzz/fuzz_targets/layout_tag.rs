#![no_main]

use conv_alter::ir::LayoutTag;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = core::str::from_utf8(data)
        && let Ok(tag) = text.parse::<LayoutTag>()
    {
        let reparsed = tag.to_string().parse::<LayoutTag>();
        assert_eq!(reparsed.ok(), Some(tag));
    }
});
