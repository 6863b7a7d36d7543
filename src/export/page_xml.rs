//! PAGE XML (2013-07-15 schema) export.
//!
//! Each page becomes one `PcGts` document holding a single text region that
//! spans the page bounding box, with one `TextLine` per detected line in
//! reading order.

use super::Exporter;
use crate::core::{OCRError, OcrResult};
use crate::pipeline::PageResult;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const PAGE_NAMESPACE: &str = "http://schema.primaresearch.org/PAGE/gts/pagecontent/2013-07-15";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const REGION_ID: &str = "region_main";
const DEFAULT_CREATOR: &str = "Transkribus";

#[derive(Debug, Clone)]
pub struct PageXmlExporter {
    output_dir: PathBuf,
    creator: String,
}

impl PageXmlExporter {
    /// Creates `<image_dir>/page`.
    pub fn new(image_dir: &Path) -> OcrResult<Self> {
        let output_dir = image_dir.join("page");
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            creator: DEFAULT_CREATOR.to_string(),
        })
    }

    /// Overrides the `Metadata/Creator` value.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn output_path(&self, image_name: &str) -> PathBuf {
        self.output_dir.join(format!("{image_name}.xml"))
    }

    /// Renders the document for `page` with the given creation timestamp.
    pub fn build_document(&self, page: &PageResult, created: &str) -> OcrResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        self.write_document(&mut writer, page, created)
            .map_err(|e| OCRError::export_error("PAGE XML document", e))?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| OCRError::export_error("PAGE XML encoding", e))
    }

    fn write_document<W: Write>(
        &self,
        writer: &mut Writer<W>,
        page: &PageResult,
        created: &str,
    ) -> io::Result<()> {
        let schema_location = format!("{PAGE_NAMESPACE} {PAGE_NAMESPACE}/pagecontent.xsd");
        let width = page.image.width().to_string();
        let height = page.image.height().to_string();

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("PcGts").with_attributes([
            ("xmlns", PAGE_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", schema_location.as_str()),
        ])))?;

        writer.write_event(Event::Start(BytesStart::new("Metadata")))?;
        write_text_element(writer, "Creator", &self.creator)?;
        write_text_element(writer, "Created", created)?;
        writer.write_event(Event::End(BytesEnd::new("Metadata")))?;

        writer.write_event(Event::Start(BytesStart::new("Page").with_attributes([
            ("imageFilename", page.image_file_name.as_str()),
            ("imageWidth", width.as_str()),
            ("imageHeight", height.as_str()),
        ])))?;
        writer.write_event(Event::Start(BytesStart::new("ReadingOrder")))?;
        writer.write_event(Event::Start(BytesStart::new("OrderedGroup").with_attributes([
            ("id", "1234_0"),
            ("caption", "Regions reading order"),
        ])))?;
        writer.write_event(Event::Empty(
            BytesStart::new("RegionRefIndexed")
                .with_attributes([("index", "0"), ("regionRef", REGION_ID)]),
        ))?;
        writer.write_event(Event::End(BytesEnd::new("OrderedGroup")))?;
        writer.write_event(Event::End(BytesEnd::new("ReadingOrder")))?;

        writer.write_event(Event::Start(BytesStart::new("TextRegion").with_attributes([
            ("id", REGION_ID),
            ("custom", "readingOrder {index:0;}"),
        ])))?;
        let region_points = page.page_bbox.points_string();
        writer.write_event(Event::Empty(
            BytesStart::new("Coords").with_attributes([("points", region_points.as_str())]),
        ))?;
        for (index, contour) in page.contours.iter().enumerate() {
            let text = page.texts.get(index).map(String::as_str).unwrap_or("");
            let id = format!("line_{index}");
            let custom = format!("readingOrder {{index:{index};}}");
            let points = contour.points_string();

            writer.write_event(Event::Start(
                BytesStart::new("TextLine")
                    .with_attributes([("id", id.as_str()), ("custom", custom.as_str())]),
            ))?;
            writer.write_event(Event::Empty(
                BytesStart::new("Coords").with_attributes([("points", points.as_str())]),
            ))?;
            writer.write_event(Event::Start(BytesStart::new("TextEquiv")))?;
            write_text_element(writer, "Unicode", text)?;
            writer.write_event(Event::End(BytesEnd::new("TextEquiv")))?;
            writer.write_event(Event::End(BytesEnd::new("TextLine")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("TextRegion")))?;
        writer.write_event(Event::End(BytesEnd::new("Page")))?;
        writer.write_event(Event::End(BytesEnd::new("PcGts")))
    }
}

/// Writes `<name>text</name>` on one line, escaping `text`.
fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

/// Local time with millisecond precision, e.g. `2024-05-01T13:45:12.345`.
pub fn timestamp_now() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.3f")
        .to_string()
}

impl Exporter for PageXmlExporter {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn export(&self, page: &PageResult) -> OcrResult<()> {
        let document = self.build_document(page, &timestamp_now())?;
        let path = self.output_path(&page.image_name);
        std::fs::write(&path, document)?;
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }
}
