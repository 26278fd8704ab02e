/*!
 * Writes a compiled signal table out as a C configuration header or as JSON
 */

use std::fmt::Write;

use crate::byte_layout::{ByteLayout, ByteSegment};
use crate::compiler::Compilation;

pub const DEFAULT_GUARD: &str = "_LIN_CFG__H";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Include guard macro name.
    pub guard: String,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        HeaderOptions {
            guard: DEFAULT_GUARD.to_string(),
        }
    }
}

/// Render the whole configuration header.
pub fn compilation_to_header(compilation: &Compilation, options: &HeaderOptions) -> String {
    let mut s = String::new();
    writeln!(s, "#ifndef {}", options.guard).unwrap();
    writeln!(s, "#define {}\n", options.guard).unwrap();
    s.push_str("#include \"stdint.h\"\n\n");
    s.push_str("/*LIN_Application_Define*/\n\n");

    write_signal_table(&mut s, compilation);
    write_enums(&mut s);
    for layout in &compilation.layouts {
        write_message_union(&mut s, layout, compilation.has_default_column);
    }

    s.push_str("/* Global message variables */\n");
    for layout in &compilation.layouts {
        writeln!(
            s,
            "extern {}_MSG_t {}_msg_t;",
            layout.message,
            layout.message.to_lowercase()
        )
        .unwrap();
    }
    s.push_str("\n#endif\n");
    s
}

/// Pretty-printed JSON of the full compilation, diagnostics included.
pub fn compilation_to_json(compilation: &Compilation) -> serde_json::Result<String> {
    serde_json::to_string_pretty(compilation)
}

fn write_signal_table(s: &mut String, compilation: &Compilation) {
    s.push_str("#define LIN_SIGNAL_TABLE(ENTRY) \\\n");
    let last = compilation.identifiers.len().saturating_sub(1);
    for entry in &compilation.identifiers {
        let line = format!("    ENTRY({}, 0x{:02X})", entry.name, entry.id);
        if entry.index == last {
            writeln!(s, "{line}\n").unwrap();
        } else {
            writeln!(s, "{line:<35} \\").unwrap();
        }
    }
}

fn write_enums(s: &mut String) {
    s.push_str("enum LIN_Signal_IDs\n{\n");
    s.push_str("#define GEN_ID_ENUM(name, id) name = id,\n");
    s.push_str("    LIN_SIGNAL_TABLE(GEN_ID_ENUM)\n");
    s.push_str("#undef GEN_ID_ENUM\n");
    s.push_str("};\n\n");

    s.push_str("enum LIN_Signal_Indexes\n{\n");
    s.push_str("#define GEN_IDX_ENUM(name, id) name##_IDX,\n");
    s.push_str("    LIN_SIGNAL_TABLE(GEN_IDX_ENUM)\n");
    s.push_str("        TABLE_SIZE,\n");
    s.push_str("#undef GEN_IDX_ENUM\n");
    s.push_str("};\n\n");
}

fn write_message_union(s: &mut String, layout: &ByteLayout, has_default_column: bool) {
    writeln!(s, "typedef union // 0x{:02X}", layout.id).unwrap();
    s.push_str("{\n    struct\n    {\n");
    for (byte_index, segments) in layout.bytes.iter().enumerate() {
        writeln!(s, "        /*byte{byte_index}*/").unwrap();
        for segment in segments {
            write_bitfield(s, segment);
        }
    }
    s.push_str("    };\n");
    s.push_str("    uint8_t _buf[8];\n");

    if has_default_column {
        let bytes: Vec<String> = layout
            .default_image
            .bytes()
            .iter()
            .map(|b| format!("0x{b:02X}"))
            .collect();
        writeln!(
            s,
            "}} {}_MSG_t; /* init_DefaultValue = {{{}}} */\n",
            layout.message,
            bytes.join(", ")
        )
        .unwrap();
    } else {
        writeln!(s, "}} {}_MSG_t;\n", layout.message).unwrap();
    }
}

fn write_bitfield(s: &mut String, segment: &ByteSegment) {
    write!(s, "        uint8_t {} : {};", segment.label, segment.width()).unwrap();
    if let Some(bits) = segment.default_bits {
        // one hex digit per started nibble
        let digits = usize::from(segment.width()).div_ceil(4);
        write!(s, " /* default: 0x{bits:0digits$X} */").unwrap();
    }
    s.push('\n');
}
