use std::sync::LazyLock;

use crate::types::Calendar;

use scraper::{ElementRef, Html, Selector};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing expected element: {0}")]
    MissingElement(&'static str),
}

static SEL_RESERVATION_GROUPS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.reservation-groups").expect("invalid selector: reservation groups")
});
static SEL_SELECT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select").expect("invalid selector: select"));
static SEL_OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("option").expect("invalid selector: option"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub fn parse_calendar_list(html: &str) -> Result<Vec<Calendar>, ParseError> {
    let document = Html::parse_document(html);

    let container = document
        .select(&SEL_RESERVATION_GROUPS)
        .next()
        .ok_or(ParseError::MissingElement("div.reservation-groups"))?;

    let select = container
        .select(&SEL_SELECT)
        .next()
        .ok_or(ParseError::MissingElement("select inside div.reservation-groups"))?;

    select
        .select(&SEL_OPTION)
        .map(|option| -> Result<Calendar, ParseError> {
            let name = elem_text(option);
            let id = option.value().attr("value").ok_or_else(|| {
                log::warn!("Calendar option '{}' has no value attribute", name);
                ParseError::MissingElement("value attribute on calendar option")
            })?;
            Ok(Calendar::new(id, name))
        })
        .collect()
}
