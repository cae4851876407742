//! Command-line front end: load the reservation list, filter it, print it,
//! and optionally move one reservation to a new status.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use lodge_client::{ClientConfig, InMemoryReservationApi, LoadState, ReservationEngine};
use lodge_core::ReservationId;
use lodge_reservations::format::format_currency;
use lodge_reservations::{ReservationStatus, SortOrder, StatusFilter};

const USAGE: &str = "usage: lodge-client [--demo] [--search TEXT] [--status STATUS] \
                     [--date YYYY-MM-DD] [--sort canonical|urgency] [--set-status ID STATUS]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    demo: bool,
    search: Option<String>,
    status: Option<String>,
    date: Option<NaiveDate>,
    sort: SortOrder,
    set_status: Option<(ReservationId, ReservationStatus)>,
}

fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value =
            |flag: &str| args.next().with_context(|| format!("{flag} needs a value\n{USAGE}"));
        match arg.as_str() {
            "--demo" => parsed.demo = true,
            "--search" => parsed.search = Some(value("--search")?),
            "--status" => parsed.status = Some(value("--status")?),
            "--date" => {
                let raw = value("--date")?;
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("--date expects YYYY-MM-DD, got {raw:?}"))?;
                parsed.date = Some(date);
            }
            "--sort" => parsed.sort = value("--sort")?.parse()?,
            "--set-status" => {
                let id: ReservationId = value("--set-status")?.parse()?;
                let status: ReservationStatus = value("--set-status")?.parse()?;
                parsed.set_status = Some((id, status));
            }
            "-h" | "--help" => bail!("{USAGE}"),
            other => bail!("unknown argument {other:?}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    lodge_observability::init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = ClientConfig::from_env().context("invalid LODGE_* configuration")?;

    let engine = if args.demo {
        tracing::info!("Using built-in demo data");
        ReservationEngine::new(Arc::new(InMemoryReservationApi::demo()), config)
    } else {
        tracing::info!("Using reservation API at {}", config.api_url);
        ReservationEngine::from_config(config).context("failed to build HTTP client")?
    };

    engine.load_all().await.context("failed to load reservations")?;
    if let LoadState::PartiallyLoaded { message } = engine.load_state() {
        eprintln!("warning: {message}");
        engine.dismiss_error()?;
    }

    if let Some((id, status)) = args.set_status {
        engine
            .update_status(id, status)
            .await
            .with_context(|| format!("failed to move reservation {id} to {status}"))?;
        println!("Reservation {id} is now {}", status.label());
    }

    if let Some(term) = args.search {
        engine.set_search_term(term)?;
    }
    if let Some(status) = args.status {
        engine.set_status_filter(StatusFilter::parse(&status))?;
    }
    engine.set_date_filter(args.date)?;
    engine.set_sort_order(args.sort)?;

    let visible = engine.visible();
    for r in visible.iter() {
        println!(
            "{:<10} {:<12} {:<22} {:<6} {:<10} {:<26} {:>12} {:>12}",
            r.code,
            r.status.label(),
            r.guest.name,
            r.room.room_number,
            r.room.room_type,
            r.stay_display,
            format_currency(r.total_amount),
            format_currency(r.balance()),
        );
    }

    let summary = engine.summary(Local::now().date_naive());
    println!(
        "{} reservation(s), {} arriving today, {} departing today, {} outstanding",
        summary.total,
        summary.arrivals,
        summary.departures,
        format_currency(summary.outstanding),
    );

    engine.shutdown();
    Ok(())
}
