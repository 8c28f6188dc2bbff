/// quick start - minimal example to get started
use chrono::{TimeZone, Utc};
use hostel_billing_rs::{
    Actor, BillingConfig, BillingEngine, Money, ResidentIntake, RoomType, SafeTimeProvider,
    TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
    ));
    let warden = Actor::named("warden");

    // mess prices and a standard deposit
    let mut engine = BillingEngine::new(BillingConfig::with_rates(
        Money::from_major(5_000),
        Money::from_major(60),
        Money::from_major(120),
        Money::from_major(100),
    ));

    // a two-seat room at 4,500 per seat
    let room = engine.add_room(
        "101",
        RoomType::TwoSeater,
        Money::from_major(4_500),
        &warden,
        &time,
    )?;
    let seat = engine
        .ledger()
        .seats_in(room)
        .next()
        .ok_or("room has no seats")?
        .id;

    // register a resident straight onto the seat
    let resident = engine.move_in(
        ResidentIntake {
            name: "Ali Raza".to_string(),
            cnic: "35202-1111111-1".to_string(),
            phone: Some("0300-1234567".to_string()),
            guardian_phone: None,
            move_in: time.now().date_naive(),
            deposit: None,
        },
        Some(seat),
        None,
        &warden,
        &time,
    )?;

    // move-in issued the deposit invoice and the january rent invoice
    for invoice in engine.ledger().invoices_for(resident) {
        println!("{}: {} due ({})", invoice.period, invoice.total_due, invoice.status);
    }

    Ok(())
}
