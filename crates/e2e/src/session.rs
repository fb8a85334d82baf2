//! Test-account generation and registration pacing
//!
//! The staging backend provisions accounts from tags embedded in the signup
//! email address, so "a user with 10k balance and 20% discount" is just an
//! address. It also rate-limits registrations, hence the throttle.

use std::time::{Duration, Instant};

use rand::Rng;

/// Balance/cashback/discount tags encoded into a throwaway account email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountTags {
    pub balance: Option<u32>,
    pub cashback: Option<u32>,
    pub discount: Option<u32>,
}

/// Generate a unique test account email, e.g.
/// `test01234567+10000+c10+d20@test.com`.
///
/// `worker` keeps addresses unique across parallel runner processes.
pub fn test_email(tags: AccountTags, worker: usize) -> String {
    let mut rng = rand::thread_rng();
    let random: u32 = rng.gen_range(1_000_000..10_000_000);

    let mut suffix = String::new();
    if let Some(balance) = tags.balance {
        suffix.push_str(&format!("+{balance}"));
    }
    if let Some(cashback) = tags.cashback {
        suffix.push_str(&format!("+c{cashback}"));
    }
    if let Some(discount) = tags.discount {
        suffix.push_str(&format!("+d{discount}"));
    }

    format!("test{worker}{random}{suffix}@test.com")
}

pub fn basic_user(worker: usize) -> String {
    test_email(AccountTags::default(), worker)
}

pub fn zero_balance_user(worker: usize) -> String {
    test_email(AccountTags { balance: Some(0), ..Default::default() }, worker)
}

pub fn user_with_balance(worker: usize) -> String {
    test_email(AccountTags { balance: Some(10_000), ..Default::default() }, worker)
}

pub fn premium_user(worker: usize) -> String {
    test_email(
        AccountTags { balance: Some(50_000), cashback: Some(10), discount: Some(20) },
        worker,
    )
}

/// Time source for the registration throttle, injectable for tests.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;
    async fn sleep(&mut self, duration: Duration);
}

/// Wall-clock implementation used by the runner. Sleeping goes through the
/// runtime so a paced registration never stalls a tokio worker thread.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Spaces registrations out so the backend's rate limit (HTTP 429) is never
/// tripped by back-to-back signups.
///
/// Carried as explicit state on the runner instead of a process-wide global:
/// parallel runner processes each pace their own registrations without
/// sharing mutable state.
#[derive(Debug)]
pub struct RegistrationThrottle<C: Clock = SystemClock> {
    clock: C,
    min_spacing: Duration,
    last: Option<Instant>,
}

impl RegistrationThrottle<SystemClock> {
    pub fn new(min_spacing: Duration) -> Self {
        Self::with_clock(SystemClock, min_spacing)
    }
}

impl<C: Clock> RegistrationThrottle<C> {
    pub fn with_clock(clock: C, min_spacing: Duration) -> Self {
        Self { clock, min_spacing, last: None }
    }

    /// Wait until at least `min_spacing` has passed since the previous call.
    /// The first call never waits.
    pub async fn pace(&mut self) {
        if let Some(last) = self.last {
            let elapsed = self.clock.now().duration_since(last);
            if elapsed < self.min_spacing {
                self.clock.sleep(self.min_spacing - elapsed).await;
            }
        }
        self.last = Some(self.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn email_encodes_all_tags_in_order() {
        let email = test_email(
            AccountTags { balance: Some(10_000), cashback: Some(10), discount: Some(20) },
            3,
        );
        assert!(email.starts_with("test3"), "{email}");
        assert!(email.ends_with("+10000+c10+d20@test.com"), "{email}");
    }

    #[test]
    fn zero_balance_is_encoded_explicitly() {
        let email = zero_balance_user(0);
        assert!(email.contains("+0@"), "{email}");
    }

    #[test]
    fn basic_user_has_no_tags() {
        let email = basic_user(1);
        assert!(!email.contains('+'), "{email}");
        assert!(email.ends_with("@test.com"));
    }

    #[test]
    fn generated_emails_differ() {
        assert_ne!(basic_user(0), basic_user(0));
    }

    /// Clock that advances only via `sleep`, recording every wait.
    struct FakeClock {
        start: Instant,
        offset: Duration,
        slept: Rc<RefCell<Vec<Duration>>>,
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.start + self.offset
        }

        async fn sleep(&mut self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
            self.offset += duration;
        }
    }

    #[tokio::test]
    async fn throttle_waits_only_when_calls_are_too_close() {
        let slept = Rc::new(RefCell::new(Vec::new()));
        let clock = FakeClock {
            start: Instant::now(),
            offset: Duration::ZERO,
            slept: Rc::clone(&slept),
        };
        let mut throttle = RegistrationThrottle::with_clock(clock, Duration::from_secs(1));

        throttle.pace().await;
        assert!(slept.borrow().is_empty(), "first call never waits");

        throttle.pace().await;
        assert_eq!(slept.borrow().as_slice(), &[Duration::from_secs(1)]);

        // after a sleep the spacing is already satisfied
        throttle.clock.offset += Duration::from_secs(5);
        throttle.pace().await;
        assert_eq!(slept.borrow().len(), 1);
    }
}
