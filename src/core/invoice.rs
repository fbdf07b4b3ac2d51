//! PDF invoice rendering.
//!
//! Produces a plain A4 invoice with the built-in Helvetica fonts, so no font
//! files need to ship with the binary. The standard fonts only cover Latin-1,
//! and anything outside printable ASCII is replaced before it is written.

use crate::{
    config::settings::CompanySettings,
    core::{round_cents, transaction::TransactionDetail},
    entities::transaction_item,
    errors::{Error, Result},
};
use lopdf::{
    Dictionary, Document, Object, ObjectId, Stream,
    content::{Content, Operation},
    dictionary,
};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const LINE_HEIGHT: i64 = 16;
/// Lowest baseline an item row may use before the table continues on a new page
const TABLE_BOTTOM: i64 = 90;
/// Vertical space the totals block needs below the last row
const TOTALS_HEIGHT: i64 = 110;

const COL_DESCRIPTION: i64 = MARGIN;
const COL_QUANTITY: i64 = 330;
const COL_UNIT_PRICE: i64 = 400;
const COL_AMOUNT: i64 = 485;
const DESCRIPTION_CHARS: usize = 48;

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    const fn resource_name(self) -> &'static [u8] {
        match self {
            Self::Regular => b"F1",
            Self::Bold => b"F2",
        }
    }
}

/// Accumulates the drawing operations of one page.
struct PageCanvas {
    operations: Vec<Operation>,
    y: i64,
}

impl PageCanvas {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn text(&mut self, font: Font, size: i64, x: i64, y: i64, text: &str) {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.resource_name().to_vec()), Object::Integer(size)],
            ),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(y)]),
            Operation::new("Tj", vec![Object::string_literal(pdf_safe(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Writes one line at the cursor and moves the cursor down.
    fn line(&mut self, font: Font, size: i64, text: &str) {
        let y = self.y;
        self.text(font, size, MARGIN, y, text);
        self.y -= LINE_HEIGHT;
    }

    fn rule(&mut self) {
        let y = self.y + LINE_HEIGHT / 2;
        self.operations.extend([
            Operation::new("w", vec![Object::Real(0.5)]),
            Operation::new("m", vec![Object::Integer(MARGIN), Object::Integer(y)]),
            Operation::new(
                "l",
                vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(y)],
            ),
            Operation::new("S", vec![]),
        ]);
        self.y -= LINE_HEIGHT / 2;
    }

    fn gap(&mut self, lines: i64) {
        self.y -= LINE_HEIGHT * lines;
    }
}

/// Replaces characters the standard fonts cannot show.
fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

fn money(currency_symbol: &str, amount: f64) -> String {
    format!("{currency_symbol}{:.2}", round_cents(amount))
}

fn quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{quantity:.0}")
    } else {
        format!("{quantity:.2}")
    }
}

fn draw_table_header(canvas: &mut PageCanvas) {
    let y = canvas.y;
    canvas.text(Font::Bold, 10, COL_DESCRIPTION, y, "Description");
    canvas.text(Font::Bold, 10, COL_QUANTITY, y, "Qty");
    canvas.text(Font::Bold, 10, COL_UNIT_PRICE, y, "Unit price");
    canvas.text(Font::Bold, 10, COL_AMOUNT, y, "Amount");
    canvas.y -= LINE_HEIGHT;
    canvas.rule();
}

fn draw_item(canvas: &mut PageCanvas, item: &transaction_item::Model, currency_symbol: &str) {
    let y = canvas.y;
    canvas.text(
        Font::Regular,
        10,
        COL_DESCRIPTION,
        y,
        &truncate(&item.description, DESCRIPTION_CHARS),
    );
    canvas.text(Font::Regular, 10, COL_QUANTITY, y, &quantity(item.quantity));
    canvas.text(
        Font::Regular,
        10,
        COL_UNIT_PRICE,
        y,
        &money(currency_symbol, item.unit_price),
    );
    canvas.text(
        Font::Regular,
        10,
        COL_AMOUNT,
        y,
        &money(currency_symbol, item.amount),
    );
    canvas.y -= LINE_HEIGHT;
}

fn draw_header(canvas: &mut PageCanvas, detail: &TransactionDetail, company: &CompanySettings) {
    let t = &detail.transaction;

    canvas.line(Font::Bold, 18, &company.name);
    for extra in [&company.address, &company.email, &company.phone]
        .into_iter()
        .flatten()
    {
        canvas.line(Font::Regular, 10, extra);
    }
    canvas.gap(1);

    canvas.line(Font::Bold, 16, &format!("INVOICE {}", t.invoice_number));
    canvas.line(Font::Regular, 10, &format!("Issue date: {}", t.issue_date));
    canvas.line(Font::Regular, 10, &format!("Due date: {}", t.due_date));
    if let Some(description) = &t.description {
        canvas.line(Font::Regular, 10, description);
    }
    canvas.gap(1);

    let client = &detail.client;
    canvas.line(Font::Bold, 11, "Bill to");
    canvas.line(Font::Regular, 10, &client.name);
    if let Some(company_name) = client.company.as_ref().filter(|c| **c != client.name) {
        canvas.line(Font::Regular, 10, company_name);
    }
    if let Some(address) = &client.address {
        canvas.line(Font::Regular, 10, address);
    }
    canvas.line(Font::Regular, 10, &client.email);
    canvas.gap(1);
}

fn draw_totals(canvas: &mut PageCanvas, detail: &TransactionDetail, currency_symbol: &str) {
    let t = &detail.transaction;
    canvas.rule();

    let rows = [
        ("Total", t.total_amount, Font::Bold),
        ("Paid", t.paid_amount, Font::Regular),
        ("Balance due", t.total_amount - t.paid_amount, Font::Bold),
    ];
    for (label, amount, font) in rows {
        let y = canvas.y;
        canvas.text(font, 11, COL_UNIT_PRICE, y, label);
        canvas.text(font, 11, COL_AMOUNT, y, &money(currency_symbol, amount));
        canvas.y -= LINE_HEIGHT;
    }
    canvas.gap(1);

    canvas.line(
        Font::Regular,
        10,
        &format!("Status: {}", t.status.as_str().to_uppercase()),
    );
    if let Some(notes) = &t.notes {
        canvas.line(Font::Regular, 9, notes);
    }
}

/// Lays the invoice out over as many pages as its items need.
fn layout_pages(
    detail: &TransactionDetail,
    company: &CompanySettings,
    currency_symbol: &str,
) -> Vec<PageCanvas> {
    let mut pages = Vec::new();
    let mut canvas = PageCanvas::new();
    draw_header(&mut canvas, detail, company);
    draw_table_header(&mut canvas);

    for item in &detail.items {
        if canvas.y < TABLE_BOTTOM {
            pages.push(canvas);
            canvas = PageCanvas::new();
            canvas.line(
                Font::Bold,
                11,
                &format!("INVOICE {} (continued)", detail.transaction.invoice_number),
            );
            canvas.gap(1);
            draw_table_header(&mut canvas);
        }
        draw_item(&mut canvas, item, currency_symbol);
    }

    if canvas.y - TOTALS_HEIGHT < MARGIN {
        pages.push(canvas);
        canvas = PageCanvas::new();
    }
    draw_totals(&mut canvas, detail, currency_symbol);
    pages.push(canvas);

    pages
}

fn pdf_error(e: &lopdf::Error) -> Error {
    Error::Pdf {
        message: e.to_string(),
    }
}

/// Renders an invoice as an uncompressed PDF document.
///
/// The first page carries the company header, invoice number and dates, the
/// bill-to block and the item table; items that do not fit continue on
/// further pages, and the totals with the status line close the last page.
pub fn render_invoice_pdf(
    detail: &TransactionDetail,
    company: &CompanySettings,
    currency_symbol: &str,
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids = Vec::new();
    for canvas in layout_pages(detail, company, currency_symbol) {
        let content = Content {
            operations: canvas.operations,
        };
        let bytes = content.encode().map_err(|e| pdf_error(&e))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = i64::try_from(kids.len()).map_err(|e| Error::Pdf {
        message: e.to_string(),
    })?;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| Error::Pdf {
        message: e.to_string(),
    })?;
    Ok(buffer)
}
