/// quick start - generate a repayment schedule and print it
use loan_schedule_rs::chrono::NaiveDate;
use loan_schedule_rs::{
    AmortizationMethod, Cadence, EngineConfig, LoanTerms, Money, Rate, ScheduleGenerator,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad start date")?;

    // 1,200,000 over 12 payments every 30 days at 28% a year
    let terms = LoanTerms::new(
        start,
        Money::from_major(1_200_000),
        Rate::from_percentage(28),
        12,
        Cadence::FixedDays(30),
        AmortizationMethod::EqualPayment,
    );

    let generator = ScheduleGenerator::new(EngineConfig::day_cadence());
    let schedule = generator.generate(&terms)?;

    println!("{:>3}  {:<10}  {:>10}  {:>10}  {:>10}  {:>10}", "#", "date", "principal", "interest", "total", "balance");
    for inst in schedule.installments() {
        println!(
            "{:>3}  {}  {:>10}  {:>10}  {:>10}  {:>10}",
            inst.period, inst.payment_date, inst.principal, inst.interest, inst.total, inst.remaining_balance
        );
    }

    let totals = schedule.totals()?;
    println!(
        "{:>3}  {:<10}  {:>10}  {:>10}  {:>10}",
        "", "total", totals.principal, totals.interest, totals.total
    );

    // stored form
    println!("\n{}", schedule.to_json()?);

    Ok(())
}
