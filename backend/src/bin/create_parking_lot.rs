use anyhow::{bail, Context};
use parking_backend::{
    config::Config,
    db::connection::create_pool,
    models::{parking_lot::ParkingLot, Position},
    repositories::{ParkingDirectory, ParkingDirectoryTrait},
    services::billing::pricing_rule,
};

const USAGE: &str = "usage: create_parking_lot <name> <lat> <lon> <first_hour_fee> <extra_hour_rate> \
                     [--address <address>] [--floor <floor>] [--area <area>]";

#[derive(Debug)]
struct CreateLotOptions {
    name: String,
    address: String,
    position: Position,
    first_hour_fee: f64,
    extra_hour_rate: f64,
    floor: Option<String>,
    area: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = parse_options(std::env::args().skip(1))?;
    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let mut lot = ParkingLot::new(
        options.name,
        options.address,
        options.position,
        options.first_hour_fee,
        options.extra_hour_rate,
    );
    lot.floor = options.floor;
    lot.area = options.area;

    let lot = ParkingDirectory::new(pool)
        .create_parking_lot(&lot)
        .await
        .with_context(|| format!("failed to insert parking lot {}", lot.name))?;

    println!(
        "Created parking lot {} ({}): {}",
        lot.name,
        lot.id,
        pricing_rule(lot.first_hour_fee, lot.extra_hour_rate)
    );
    Ok(())
}

fn parse_number(raw: &str, field: &str) -> anyhow::Result<f64> {
    let value: f64 = raw
        .parse()
        .with_context(|| format!("{field} must be a number, got {raw:?}"))?;
    if !value.is_finite() {
        bail!("{field} must be finite");
    }
    Ok(value)
}

fn parse_options<I>(args: I) -> anyhow::Result<CreateLotOptions>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut positional = Vec::new();
    let mut address = String::new();
    let mut floor = None;
    let mut area = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            flag @ ("--address" | "--floor" | "--area") => {
                let value = args
                    .next()
                    .with_context(|| format!("{flag} needs a value"))?
                    .as_ref()
                    .trim()
                    .to_string();
                match flag {
                    "--address" => address = value,
                    "--floor" => floor = Some(value),
                    _ => area = Some(value),
                }
            }
            other => positional.push(other.to_string()),
        }
    }

    let [name, lat, lon, first_hour_fee, extra_hour_rate]: [String; 5] =
        match positional.try_into() {
            Ok(fields) => fields,
            Err(_) => bail!(USAGE),
        };
    if name.trim().is_empty() {
        bail!("name must not be empty");
    }

    let position = Position {
        lat: parse_number(&lat, "lat")?,
        lon: parse_number(&lon, "lon")?,
    };
    if !(-90.0..=90.0).contains(&position.lat) || !(-180.0..=180.0).contains(&position.lon) {
        bail!("coordinates out of range");
    }
    let first_hour_fee = parse_number(&first_hour_fee, "first_hour_fee")?;
    let extra_hour_rate = parse_number(&extra_hour_rate, "extra_hour_rate")?;
    if first_hour_fee < 0.0 || extra_hour_rate < 0.0 {
        bail!("fees must not be negative");
    }

    Ok(CreateLotOptions {
        name: name.trim().to_string(),
        address,
        position,
        first_hour_fee,
        extra_hour_rate,
        floor,
        area,
    })
}
