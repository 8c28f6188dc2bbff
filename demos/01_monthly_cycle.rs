/// monthly cycle - meals and charges flowing into generated invoices
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use hostel_billing_rs::{
    Actor, BillingConfig, BillingEngine, BillingPeriod, ChargeType, Meal, Money, Month,
    NewCharge, PaymentMethod, PaymentRequest, ResidentIntake, RoomType, SafeTimeProvider,
    TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== monthly cycle example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
    ));
    let control = time.test_control().unwrap();
    let warden = Actor::named("warden");

    let mut engine = BillingEngine::new(BillingConfig::with_rates(
        Money::from_major(5_000),
        Money::from_major(60),
        Money::from_major(120),
        Money::from_major(100),
    ));
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
    let ali = engine.move_in(
        ResidentIntake {
            name: "Ali Raza".to_string(),
            cnic: "35202-1111111-1".to_string(),
            phone: None,
            guardian_phone: None,
            move_in: time.now().date_naive(),
            deposit: None,
        },
        Some(seat),
        None,
        &warden,
        &time,
    )?;

    // settle the move-in invoices in full
    let move_in_invoices: Vec<_> = engine
        .ledger()
        .invoices_for(ali)
        .map(|i| (i.id, i.total_due))
        .collect();
    for (invoice_id, due) in move_in_invoices {
        engine.apply_payment(
            PaymentRequest {
                invoice_id,
                amount: due,
                date: time.now().date_naive(),
                method: PaymentMethod::Cash,
                notes: None,
            },
            &warden,
            &time,
        )?;
    }
    println!("january settled on move-in\n");

    // into february: some meals and an electricity charge
    control.advance(Duration::days(31));
    let feb = |d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap();
    engine.mark_meal(ali, feb(3), Meal::Lunch, true)?;
    engine.mark_meal(ali, feb(4), Meal::Lunch, true)?;
    engine.mark_meal(ali, feb(4), Meal::Dinner, true)?;
    engine.add_charge(
        NewCharge {
            resident_id: ali,
            date: feb(10),
            charge_type: ChargeType::Electricity,
            amount: Money::from_major(350),
            notes: Some("heater usage".to_string()),
        },
        &warden,
        &time,
    )?;

    // month end: generate february invoices
    control.advance(Duration::days(27));
    let february: Month = "2024-02".parse()?;
    let report = engine.generate_invoices(february, &warden, &time);
    println!(
        "generated {} invoice(s) for {}, skipped {}",
        report.generated, report.period, report.skipped
    );

    let invoice = engine
        .ledger()
        .invoice_for_period(ali, BillingPeriod::Month(february))
        .ok_or("february invoice missing")?;
    let invoice_id = invoice.id;
    println!("  rent {}", invoice.room_rent);
    println!("  mess {}", invoice.mess_total);
    println!("  custom {}", invoice.custom_total);
    println!("  previous dues {}", invoice.prev_dues);
    println!("  total due {}\n", invoice.total_due);

    // a partial payment against it
    let receipt = engine.apply_payment(
        PaymentRequest {
            invoice_id,
            amount: Money::from_major(3_000),
            date: time.now().date_naive(),
            method: PaymentMethod::JazzCash,
            notes: None,
        },
        &warden,
        &time,
    )?;
    println!(
        "paid 3000, invoice now {} with {} outstanding\n",
        receipt.invoice.status,
        receipt.invoice.outstanding()
    );

    let financials = engine.reports().monthly_financials(february);
    println!("february: billed {}, collected {}", financials.billed, financials.collected);
    for pending in engine.reports().top_pending_dues(5) {
        println!("pending: {} owes {}", pending.name, pending.outstanding);
    }

    Ok(())
}
