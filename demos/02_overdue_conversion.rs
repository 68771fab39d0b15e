/// overdue conversion - quote overdue interest and re-root the unpaid principal
use loan_schedule_rs::chrono::NaiveDate;
use loan_schedule_rs::{
    overdue_interest, AmortizationMethod, Cadence, EngineConfig, EventStore, LoanTerms, Money,
    OverdueCalculator, Rate, ScheduleGenerator,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== overdue conversion example ===\n");

    // single amount: 100,000 at 28% for 10 days late
    let interest = overdue_interest(Money::from_major(100_000), 10, Rate::from_percentage(28))?;
    println!("overdue interest on 100,000 for 10 days: {}\n", interest);

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad start date")?;
    let rate = Rate::from_percentage(28);
    let terms = LoanTerms::new(
        start,
        Money::from_major(1_200_000),
        rate,
        12,
        Cadence::FixedDays(30),
        AmortizationMethod::EqualPrincipal,
    );

    let config = EngineConfig::day_cadence();
    let generator = ScheduleGenerator::new(config.clone());
    let mut events = EventStore::new();
    let mut schedule = generator.generate(&terms)?;

    let today = NaiveDate::from_ymd_opt(2024, 3, 11).ok_or("bad date")?;
    schedule.mark_paid_through(1, today, &mut events)?;
    schedule.sweep_overdue(today, &mut events);

    let summary = OverdueCalculator::new(config.overdue).quote_schedule(&schedule, rate, today)?;
    for quote in &summary.quotes {
        println!(
            "installment {:>2} due {} ({} days late): {} + {} interest",
            quote.period, quote.payment_date, quote.days_late, quote.base_amount, quote.interest_amount
        );
    }
    println!("total due today: {}\n", summary.total_due()?);

    // convert the unpaid principal into a fresh 6-payment annuity from today
    let rerooted = schedule.reroot(
        today,
        rate,
        6,
        Cadence::FixedDays(30),
        AmortizationMethod::EqualPayment,
        &generator,
        &mut events,
    )?;
    println!("re-rooted {} over {} payments", rerooted.principal(), rerooted.len());
    for inst in rerooted.installments() {
        println!("  {:>2}  {}  {:>10}", inst.period, inst.payment_date, inst.total);
    }

    Ok(())
}
