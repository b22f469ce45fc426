use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use serde::Serialize;

use crate::config::{OpenJawRule, RouteRule};
use crate::deal::Deal;

pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn render_routes_table(routes: &[RouteRule]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Destination",
        "Name",
        "Category",
        "Max Stops",
        "Via",
        "Ceiling",
        "Non-stop First",
    ]);
    for route in routes {
        table.add_row(Row::from(vec![
            Cell::new(&route.destination),
            Cell::new(&route.name),
            Cell::new(route.category.to_string()),
            Cell::new(route.max_stopovers.to_string()),
            Cell::new(route.stopover_country.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.0}", route.price_ceiling)),
            Cell::new(if route.non_stop_preferred { "yes" } else { "no" }),
        ]));
    }
    table.to_string()
}

pub fn render_open_jaw_table(routes: &[OpenJawRule]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Outbound To",
        "Return From",
        "Category",
        "Max Stops",
        "Ceiling",
    ]);
    for route in routes {
        table.add_row(Row::from(vec![
            Cell::new(format!("{} ({})", route.outbound_to, route.outbound_name)),
            Cell::new(format!("{} ({})", route.inbound_from, route.inbound_name)),
            Cell::new(route.category.to_string()),
            Cell::new(route.max_stopovers.to_string()),
            Cell::new(format!("{:.0}", route.price_ceiling)),
        ]));
    }
    table.to_string()
}

pub fn render_deals_table(deals: &[Deal]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Kind", "Route", "Dates", "Stops", "Price", "Airlines"]);
    for deal in deals {
        let kind = if deal.is_open_jaw() { "OJ" } else { "RT" };
        let route = match deal.return_origin() {
            Some(return_origin) => {
                format!("{} → {}", deal.destination().code, return_origin.code)
            }
            None => deal.destination().code.clone(),
        };
        let price = format!("{:.0} {}", deal.price, deal.currency);
        // Well under the ceiling reads as a standout fare.
        let price_cell = if deal.price < deal.price_ceiling * 0.6 {
            Cell::new(&price).fg(Color::Green)
        } else {
            Cell::new(&price)
        };
        table.add_row(Row::from(vec![
            Cell::new(kind),
            Cell::new(route),
            Cell::new(format!("{} → {}", deal.outbound_date, deal.inbound_date)),
            Cell::new(format!("{}/{}", deal.outbound_stops, deal.inbound_stops)),
            price_cell,
            Cell::new(deal.airlines.join(", ")),
        ]));
    }
    table.to_string()
}
