//! Cobertura XML serialization

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use super::{Class, Document, Line, Package};
use crate::error::EncodeError;

pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Cobertura 4.0 DTD, emitted verbatim ahead of the root element
pub const COBERTURA_DOCTYPE: &str = r#"<!DOCTYPE coverage SYSTEM "http://cobertura.sourceforge.net/xml/coverage-04.dtd" [
    <!ELEMENT coverage (sources?, packages)>
    <!ATTLIST coverage line-rate CDATA #REQUIRED>
    <!ATTLIST coverage branch-rate CDATA #REQUIRED>
    <!ATTLIST coverage lines-covered CDATA #REQUIRED>
    <!ATTLIST coverage lines-valid CDATA #REQUIRED>
    <!ATTLIST coverage branches-covered CDATA #REQUIRED>
    <!ATTLIST coverage branches-valid CDATA #REQUIRED>
    <!ATTLIST coverage complexity CDATA #REQUIRED>
    <!ATTLIST coverage version CDATA #REQUIRED>
    <!ATTLIST coverage timestamp CDATA #REQUIRED>
    <!ELEMENT sources (source)*>
    <!ELEMENT source (#PCDATA)>
    <!ELEMENT packages (package)*>
    <!ELEMENT package (classes)>
    <!ATTLIST package name CDATA #REQUIRED>
    <!ATTLIST package line-rate CDATA #REQUIRED>
    <!ATTLIST package branch-rate CDATA #REQUIRED>
    <!ATTLIST package complexity CDATA #REQUIRED>
    <!ELEMENT classes (class)*>
    <!ELEMENT class (methods, lines)>
    <!ATTLIST class name CDATA #REQUIRED>
    <!ATTLIST class filename CDATA #REQUIRED>
    <!ATTLIST class line-rate CDATA #REQUIRED>
    <!ATTLIST class branch-rate CDATA #REQUIRED>
    <!ATTLIST class complexity CDATA #REQUIRED>
    <!ELEMENT methods (method)*>
    <!ELEMENT method (lines)>
    <!ATTLIST method name CDATA #REQUIRED>
    <!ATTLIST method signature CDATA #REQUIRED>
    <!ATTLIST method line-rate CDATA #REQUIRED>
    <!ATTLIST method branch-rate CDATA #REQUIRED>
    <!ATTLIST method complexity CDATA #REQUIRED>
    <!ELEMENT lines (line)*>
    <!ELEMENT line (conditions)*>
    <!ATTLIST line number CDATA #REQUIRED>
    <!ATTLIST line hits CDATA #REQUIRED>
    <!ATTLIST line branch CDATA "false">
    <!ATTLIST line condition-coverage CDATA "100%">
    <!ELEMENT conditions (condition)*>
    <!ELEMENT condition EMPTY>
    <!ATTLIST condition number CDATA #REQUIRED>
    <!ATTLIST condition type CDATA #REQUIRED>
    <!ATTLIST condition coverage CDATA #REQUIRED>
]>

"#;

const INDENT: usize = 4;

/// Render a document to Cobertura XML text
pub fn write_document(doc: &Document) -> Result<String, EncodeError> {
    let mut out = Vec::new();
    write_document_to(doc, &mut out)?;
    Ok(String::from_utf8(out)?)
}

/// Render a document into any byte sink
pub fn write_document_to<W: Write>(doc: &Document, mut out: W) -> Result<(), EncodeError> {
    out.write_all(XML_HEADER.as_bytes())?;
    out.write_all(COBERTURA_DOCTYPE.as_bytes())?;

    let mut writer = Writer::new_with_indent(out, b' ', INDENT);

    let mut coverage = BytesStart::new("coverage");
    coverage.push_attribute(("line-rate", doc.line_rate.as_str()));
    coverage.push_attribute(("branch-rate", doc.branch_rate.as_str()));
    coverage.push_attribute(("lines-covered", doc.lines_covered.as_str()));
    coverage.push_attribute(("lines-valid", doc.lines_valid.as_str()));
    coverage.push_attribute(("timestamp", doc.timestamp.as_str()));
    coverage.push_attribute(("version", doc.version.as_str()));
    coverage.push_attribute(("complexity", doc.complexity.as_str()));
    coverage.push_attribute(("branches-valid", doc.branches_valid.as_str()));
    coverage.push_attribute(("branches-covered", doc.branches_covered.as_str()));
    writer.write_event(Event::Start(coverage))?;

    writer.write_event(Event::Start(BytesStart::new("sources")))?;
    for source in &doc.sources {
        writer.write_event(Event::Start(BytesStart::new("source")))?;
        writer.write_event(Event::Text(BytesText::new(source)))?;
        writer.write_event(Event::End(BytesEnd::new("source")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("sources")))?;

    writer.write_event(Event::Start(BytesStart::new("packages")))?;
    for package in &doc.packages {
        write_package(&mut writer, package)?;
    }
    writer.write_event(Event::End(BytesEnd::new("packages")))?;

    writer.write_event(Event::End(BytesEnd::new("coverage")))?;

    let mut out = writer.into_inner();
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn write_package<W: Write>(writer: &mut Writer<W>, package: &Package) -> Result<(), EncodeError> {
    let mut start = BytesStart::new("package");
    start.push_attribute(("name", package.name.as_str()));
    start.push_attribute(("line-rate", package.line_rate.as_str()));
    start.push_attribute(("branch-rate", package.branch_rate.as_str()));
    start.push_attribute(("complexity", package.complexity.as_str()));
    writer.write_event(Event::Start(start))?;

    writer.write_event(Event::Start(BytesStart::new("classes")))?;
    for class in &package.classes {
        write_class(writer, class)?;
    }
    writer.write_event(Event::End(BytesEnd::new("classes")))?;

    writer.write_event(Event::End(BytesEnd::new("package")))?;
    Ok(())
}

fn write_class<W: Write>(writer: &mut Writer<W>, class: &Class) -> Result<(), EncodeError> {
    let mut start = BytesStart::new("class");
    start.push_attribute(("name", class.name.as_str()));
    start.push_attribute(("filename", class.filename.as_str()));
    start.push_attribute(("line-rate", class.line_rate.as_str()));
    start.push_attribute(("branch-rate", class.branch_rate.as_str()));
    start.push_attribute(("complexity", class.complexity.as_str()));
    writer.write_event(Event::Start(start))?;

    writer.write_event(Event::Start(BytesStart::new("lines")))?;
    for line in &class.lines {
        write_line(writer, line)?;
    }
    writer.write_event(Event::End(BytesEnd::new("lines")))?;

    writer.write_event(Event::End(BytesEnd::new("class")))?;
    Ok(())
}

fn write_line<W: Write>(writer: &mut Writer<W>, line: &Line) -> Result<(), EncodeError> {
    let mut start = BytesStart::new("line");
    start.push_attribute(("number", line.number.as_str()));
    start.push_attribute(("hits", line.hits.as_str()));
    start.push_attribute(("branch", line.branch.as_str()));
    writer.write_event(Event::Empty(start))?;
    Ok(())
}
