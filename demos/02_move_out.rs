/// move out - deposit settlement against open dues
use chrono::{Duration, TimeZone, Utc};
use hostel_billing_rs::{
    Actor, BillingConfig, BillingEngine, BillingPeriod, Money, PaymentMethod, PaymentRequest,
    ResidentIntake, RoomType, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== move out example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
    ));
    let control = time.test_control().unwrap();
    let warden = Actor::named("warden");

    let mut engine = BillingEngine::new(BillingConfig::default());
    let room = engine.add_room(
        "204",
        RoomType::TwoSeater,
        Money::from_major(4_000),
        &warden,
        &time,
    )?;
    let seat = engine
        .ledger()
        .seats_in(room)
        .next()
        .ok_or("room has no seats")?
        .id;
    let sara = engine.move_in(
        ResidentIntake {
            name: "Sara Khan".to_string(),
            cnic: "35202-2222222-2".to_string(),
            phone: None,
            guardian_phone: None,
            move_in: time.now().date_naive(),
            deposit: Some(Money::from_major(10_000)),
        },
        Some(seat),
        None,
        &warden,
        &time,
    )?;

    // deposit and january rent cleared in cash
    let move_in_invoices: Vec<_> = engine
        .ledger()
        .invoices_for(sara)
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

    // february rent is billed but never paid
    control.advance(Duration::days(31));
    engine.generate_invoices("2024-02".parse()?, &warden, &time);

    let preview = engine.preview_settlement(sara)?;
    println!("deposit held {}", preview.deposit);
    println!("outstanding dues {}", preview.outstanding_dues);
    println!("net {}\n", preview.net);

    let settlement = engine.move_out(sara, &warden, &time)?;
    println!("applied {} against invoices", settlement.applied);
    if let Some(expense_id) = settlement.refund_expense {
        let refund = engine
            .ledger()
            .expenses()
            .iter()
            .find(|e| e.id == expense_id)
            .ok_or("refund expense missing")?;
        println!("refund booked: {} ({})", refund.title, refund.amount);
    }

    let february = engine
        .ledger()
        .invoice_for_period(sara, BillingPeriod::Month("2024-02".parse()?))
        .ok_or("february invoice missing")?;
    println!("february invoice now {}\n", february.status);

    println!("audit trail:");
    for entry in engine.audit().recent() {
        println!("  [{}] {}", entry.action, entry.details);
    }

    Ok(())
}
