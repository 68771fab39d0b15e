/// installment lifecycle - payments, overdue registration and reverts with controlled time
use chrono::{Duration, TimeZone, Utc};
use loan_schedule_rs::{
    AmortizationMethod, Cadence, EventStore, LoanTerms, Money, Rate, SafeTimeProvider,
    ScheduleGenerator, TimeSource, Transition, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== installment lifecycle example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    let today = time.now().date_naive();

    let terms = LoanTerms::new(
        today,
        Money::from_major(600_000),
        Rate::from_percentage(12),
        6,
        Cadence::monthly(),
        AmortizationMethod::EqualPrincipal,
    );

    let mut events = EventStore::new();
    let generator = ScheduleGenerator::default();
    let mut schedule = generator.generate_recorded(Uuid::new_v4(), &terms, &mut events)?;
    println!("schedule {} generated, first payment on {}", schedule.loan_id(), schedule.installment(1)?.payment_date);

    // first installment paid on time
    controller.advance(Duration::days(31));
    schedule.apply_now(1, Transition::MarkPaid, &time, &mut events)?;
    println!("{}: installment 1 paid", time.now().format("%Y-%m-%d"));

    // paying it twice is rejected
    if let Err(err) = schedule.apply_now(1, Transition::MarkPaid, &time, &mut events) {
        println!("second payment marking rejected: {}", err);
    }

    // two months later, installment 2 has gone unpaid
    controller.advance(Duration::days(45));
    let flagged = schedule.sweep_overdue(time.now().date_naive(), &mut events);
    println!("{}: overdue installments {:?}", time.now().format("%Y-%m-%d"), flagged);

    // payment arrives, then turns out to be a mistake
    schedule.apply_now(2, Transition::MarkPaid, &time, &mut events)?;
    schedule.apply_now(2, Transition::RevertToScheduled, &time, &mut events)?;
    println!("installment 2 status after revert: {:?}", schedule.installment(2)?.status);

    let report = schedule.balance_as_of(time.now().date_naive())?;
    println!("\npaid principal:        {}", report.paid_principal);
    println!("outstanding principal: {}", report.outstanding_principal);
    println!("overdue amount:        {}", report.overdue_amount);

    println!("\n{} events recorded", events.events().len());
    for event in events.take_events() {
        println!("  {}", serde_json::to_string(&event)?);
    }

    Ok(())
}
