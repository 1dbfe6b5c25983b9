use mockall::automock;

/// Wall-clock access behind a trait so TTL logic is testable.
#[automock]
pub trait ClockService {
    fn date_time_now(&self) -> time::PrimitiveDateTime;
}
