// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/barni-rs

//! The `ToXml` persistence capability (spec §6, §9 Design Notes).
//!
//! The reference implementation gives every persistable type an abstract
//! `Serializable` base class with a `toXml()` method and dispatches readers
//! through a process-wide tag registry. This crate replaces both with an
//! explicit capability trait implemented per concrete type; there is no
//! global registry and no reader dispatch table — XML *reading*, gzip
//! framing, and file I/O are external-collaborator concerns per spec §1's
//! Non-goals. Only the minimal in-memory string emission named in §6 lives
//! here.

/// A type that can render itself as the XML fragment spec §6 specifies.
pub trait ToXml {
    /// Render `self` as an XML string.
    fn to_xml(&self) -> String;
}

/// Indents every line of `xml` by two spaces, matching the reference
/// implementation's `textwrap.indent(xml, "  ")` nesting convention.
pub(crate) fn indent(xml: &str) -> String {
    xml.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {line}\n")
            }
        })
        .collect()
}
