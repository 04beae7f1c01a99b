//! Cross-file serialization.
//!
//! Renders a [`CrossDescriptor`] into Meson's machine-file format. The
//! punctuation is load-bearing: `[section]` headers, `key = value`
//! assignments, single-quoted strings, bare booleans, bracketed
//! comma-joined lists. Meson's own parser reads this output.

use std::fmt::Write;

use super::descriptor::CrossDescriptor;

/// A serializable value in a machine file.
enum Value {
    Str(String),
    Bool(bool),
    List(Vec<String>),
}

impl Value {
    fn render(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => {
                let quoted: Vec<String> =
                    items.iter().map(|i| format!("'{}'", i)).collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }
}

/// Render a descriptor to machine-file text.
///
/// Sections appear in a fixed order; unset keys are omitted; sections with
/// no populated keys are omitted entirely; populated sections are
/// separated by a single blank line. Output is deterministic: the same
/// descriptor always renders to the same bytes.
pub fn render(descriptor: &CrossDescriptor) -> String {
    let mut sections: Vec<(&str, Vec<(&str, Value)>)> = Vec::new();

    let hm = &descriptor.host_machine;
    sections.push((
        "host_machine",
        collect([
            ("system", hm.system.clone().map(Value::Str)),
            ("subsystem", hm.subsystem.clone().map(Value::Str)),
            ("kernel", hm.kernel.clone().map(Value::Str)),
            ("cpu_family", hm.cpu_family.clone().map(Value::Str)),
            ("cpu", hm.cpu.clone().map(Value::Str)),
            ("endian", hm.endian.clone().map(Value::Str)),
        ]),
    ));

    let bins = &descriptor.binaries;
    let path = |p: &std::path::PathBuf| Value::Str(p.display().to_string());
    sections.push((
        "binaries",
        collect([
            ("c", bins.c.as_ref().map(path)),
            ("cpp", bins.cpp.as_ref().map(path)),
            ("objc", bins.objc.as_ref().map(path)),
            ("c_ld", bins.c_ld.as_ref().map(path)),
            ("cpp_ld", bins.cpp_ld.as_ref().map(path)),
            ("objc_ld", bins.objc_ld.as_ref().map(path)),
            ("ar", bins.ar.as_ref().map(path)),
            ("strip", bins.strip.as_ref().map(path)),
        ]),
    ));

    let opts = &descriptor.options;
    let list = |items: &[String]| {
        if items.is_empty() {
            None
        } else {
            Some(Value::List(items.to_vec()))
        }
    };
    sections.push((
        "built-in options",
        collect([
            ("c_args", list(&opts.c_args)),
            ("c_link_args", list(&opts.c_link_args)),
            ("cpp_args", list(&opts.cpp_args)),
            ("cpp_link_args", list(&opts.cpp_link_args)),
            ("objc_args", list(&opts.objc_args)),
            ("objc_link_args", list(&opts.objc_link_args)),
        ]),
    ));

    sections.push((
        "properties",
        collect([(
            "needs_exe_wrapper",
            descriptor.properties.needs_exe_wrapper.map(Value::Bool),
        )]),
    ));

    let mut out = String::new();
    let mut first = true;
    for (name, keys) in sections {
        if keys.is_empty() {
            continue;
        }
        if !first {
            out.push('\n');
        }
        first = false;
        writeln!(out, "[{}]", name).unwrap();
        for (key, value) in keys {
            writeln!(out, "{} = {}", key, value.render()).unwrap();
        }
    }
    out
}

fn collect<const N: usize>(entries: [(&str, Option<Value>); N]) -> Vec<(&str, Value)> {
    entries
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
}
