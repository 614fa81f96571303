use crate::database::booking::BookingRepository;
use crate::database::car::CarRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::car::Car;
use crate::models::dashboard::{AdminStatsResponse, DashboardStats, InsightResponse, InsightView};
use crate::service::ownership::is_owner;
use tracing::debug;
use uuid::Uuid;

/// Whose records a stats read covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    Owner(Uuid),
    Global,
}

impl StatsScope {
    fn covers_car(&self, car: &Car) -> bool {
        match self {
            StatsScope::Owner(owner) => is_owner(car, Some(owner)),
            StatsScope::Global => true,
        }
    }

    fn covers_booking(&self, booking: &Booking) -> bool {
        match self {
            StatsScope::Owner(owner) => is_owner(booking, Some(owner)),
            StatsScope::Global => true,
        }
    }
}

/// Pure fold over the in-scope cars and bookings.
pub fn compute_stats(scope: StatsScope, cars: &[Car], bookings: &[Booking]) -> DashboardStats {
    let total_cars = cars.iter().filter(|car| scope.covers_car(car)).count() as i64;

    bookings
        .iter()
        .filter(|booking| scope.covers_booking(booking))
        .fold(
            DashboardStats {
                total_cars,
                ..DashboardStats::default()
            },
            |mut stats, booking| {
                stats.total_bookings += 1;
                if booking.status == BookingStatus::Pending {
                    stats.pending += 1;
                }
                if booking.status.is_confirmed() {
                    stats.confirmed += 1;
                    stats.revenue = stats.revenue.saturating_add(booking.total_price);
                }
                stats
            },
        )
}

pub struct InsightPrompt {
    pub view: InsightView,
    pub stats: DashboardStats,
    pub text: String,
}

pub fn build_insight_prompt(view: InsightView, stats: DashboardStats) -> InsightPrompt {
    let text = match view {
        InsightView::Dashboard => format!(
            "Analyze my car rental business: {} cars, {} bookings, ${} revenue. Give 1 strategic tip.",
            stats.total_cars, stats.total_bookings, stats.revenue
        ),
        InsightView::Bookings => format!(
            "Analyze bookings: {} total. {} pending. Advice on managing requests?",
            stats.total_bookings, stats.pending
        ),
        InsightView::Cars => format!(
            "Analyze my fleet of {} cars. Suggest how to optimize pricing or descriptions.",
            stats.total_cars
        ),
    };

    InsightPrompt { view, stats, text }
}

/// Turns a prompt into advice text.
#[async_trait::async_trait]
pub trait InsightProvider {
    async fn generate_insight(&self, prompt: &InsightPrompt) -> Result<String, AppError>;
}

/// Canned advice picked from the numbers in the prompt. Needs no network.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedInsight;

#[async_trait::async_trait]
impl InsightProvider for RuleBasedInsight {
    async fn generate_insight(&self, prompt: &InsightPrompt) -> Result<String, AppError> {
        let stats = &prompt.stats;

        let advice = match prompt.view {
            InsightView::Dashboard if stats.total_cars == 0 => "List your first car to start receiving bookings.".to_string(),
            InsightView::Dashboard if stats.total_bookings == 0 => {
                "None of your cars has been booked yet. A lower introductory daily rate usually brings the first renters in.".to_string()
            }
            InsightView::Dashboard => {
                let per_car = stats.revenue / stats.total_cars.max(1);
                format!("Each car earns about ${per_car} in confirmed bookings. Focus on keeping your best earners available on weekends.")
            }
            InsightView::Bookings if stats.pending > 0 => format!(
                "You have {} pending request(s). Renters often book elsewhere if they wait, so answer them within a day.",
                stats.pending
            ),
            InsightView::Bookings => "No requests are waiting on you. Keep availability up to date so new ones keep coming.".to_string(),
            InsightView::Cars if stats.total_cars < 3 => {
                "A small fleet benefits most from clear photos and a detailed description of each car.".to_string()
            }
            InsightView::Cars => "Compare your daily rates across similar cars and adjust the ones that are rarely booked.".to_string(),
        };

        Ok(advice)
    }
}

pub struct DashboardService<'a, R> {
    repository: &'a R,
}

impl<'a, R> DashboardService<'a, R>
where
    R: CarRepository + BookingRepository + UserRepository,
{
    pub fn new(repository: &'a R) -> Self {
        DashboardService { repository }
    }

    pub async fn stats(&self, scope: StatsScope) -> Result<DashboardStats, AppError> {
        let (cars, bookings) = match scope {
            StatsScope::Owner(owner_id) => (
                self.repository.list_cars_by_owner(&owner_id).await?,
                self.repository.list_bookings_for_owner(&owner_id).await?,
            ),
            StatsScope::Global => (self.repository.list_all_cars().await?, self.repository.list_all_bookings().await?),
        };

        let stats = compute_stats(scope, &cars, &bookings);
        debug!(?scope, ?stats, "dashboard stats computed");
        Ok(stats)
    }

    pub async fn admin_stats(&self) -> Result<AdminStatsResponse, AppError> {
        let stats = self.stats(StatsScope::Global).await?;
        let total_users = self.repository.count_users().await?;
        Ok(AdminStatsResponse { total_users, stats })
    }

    pub async fn insight<P: InsightProvider + ?Sized>(&self, owner_id: &Uuid, view: InsightView, provider: &P) -> Result<InsightResponse, AppError> {
        let stats = self.stats(StatsScope::Owner(*owner_id)).await?;
        let prompt = build_insight_prompt(view, stats);
        let insight = provider.generate_insight(&prompt).await?;

        Ok(InsightResponse { prompt: prompt.text, insight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockRepository, sample_booking, sample_car, sample_user};
    use proptest::prelude::*;

    fn booking_with(car: &Car, status: BookingStatus, total_price: i64) -> Booking {
        Booking {
            total_price,
            ..sample_booking(car, Uuid::new_v4(), status)
        }
    }

    #[test]
    fn revenue_counts_only_confirmed_bookings() {
        let owner = Uuid::new_v4();
        let car = sample_car(owner, 50);
        let bookings = vec![
            booking_with(&car, BookingStatus::Pending, 100),
            booking_with(&car, BookingStatus::Approved, 150),
            booking_with(&car, BookingStatus::Completed, 200),
            booking_with(&car, BookingStatus::Rejected, 400),
            booking_with(&car, BookingStatus::Cancelled, 800),
        ];

        let stats = compute_stats(StatsScope::Owner(owner), std::slice::from_ref(&car), &bookings);

        assert_eq!(
            stats,
            DashboardStats {
                total_cars: 1,
                total_bookings: 5,
                pending: 1,
                confirmed: 2,
                revenue: 350,
            }
        );
    }

    #[test]
    fn owner_scope_ignores_other_owners() {
        let mine = sample_car(Uuid::new_v4(), 50);
        let theirs = sample_car(Uuid::new_v4(), 50);
        let owner = mine.owner.as_ref().and_then(|o| o.id()).unwrap();
        let bookings = vec![booking_with(&mine, BookingStatus::Approved, 10), booking_with(&theirs, BookingStatus::Approved, 20)];

        let scoped = compute_stats(StatsScope::Owner(owner), &[mine.clone(), theirs.clone()], &bookings);
        assert_eq!((scoped.total_cars, scoped.total_bookings, scoped.revenue), (1, 1, 10));

        let global = compute_stats(StatsScope::Global, &[mine, theirs], &bookings);
        assert_eq!((global.total_cars, global.total_bookings, global.revenue), (2, 2, 30));
    }

    fn any_status() -> impl Strategy<Value = BookingStatus> {
        prop::sample::select(BookingStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn revenue_is_the_sum_of_confirmed_totals(entries in prop::collection::vec((any_status(), 0i64..10_000), 0..40)) {
            let car = sample_car(Uuid::new_v4(), 50);
            let bookings: Vec<Booking> = entries.iter().map(|(status, price)| booking_with(&car, *status, *price)).collect();

            let stats = compute_stats(StatsScope::Global, std::slice::from_ref(&car), &bookings);
            let expected: i64 = entries.iter().filter(|(status, _)| status.is_confirmed()).map(|(_, price)| price).sum();

            prop_assert_eq!(stats.revenue, expected);
            prop_assert_eq!(stats.total_bookings, entries.len() as i64);
        }

        #[test]
        fn leaving_the_confirmed_set_never_raises_revenue(
            entries in prop::collection::vec((any_status(), 0i64..10_000), 1..20),
            index in any::<prop::sample::Index>(),
            next in prop::sample::select(vec![BookingStatus::Pending, BookingStatus::Rejected, BookingStatus::Cancelled]),
        ) {
            let car = sample_car(Uuid::new_v4(), 50);
            let mut bookings: Vec<Booking> = entries.iter().map(|(status, price)| booking_with(&car, *status, *price)).collect();
            let before = compute_stats(StatsScope::Global, std::slice::from_ref(&car), &bookings).revenue;

            let i = index.index(bookings.len());
            bookings[i].status = next;
            let after = compute_stats(StatsScope::Global, std::slice::from_ref(&car), &bookings).revenue;

            prop_assert!(after <= before);
        }
    }

    #[tokio::test]
    async fn admin_stats_include_user_count() {
        let repo = MockRepository::default();
        let owner = repo.insert_user(sample_user("owner@example.com"));
        repo.insert_user(sample_user("renter@example.com"));
        let car = repo.insert_car(sample_car(owner.id, 50));
        repo.insert_booking(booking_with(&car, BookingStatus::Approved, 120));

        let response = DashboardService::new(&repo).admin_stats().await.unwrap();

        assert_eq!(response.total_users, 2);
        assert_eq!(response.stats.total_cars, 1);
        assert_eq!(response.stats.revenue, 120);
    }

    #[tokio::test]
    async fn insight_uses_the_owner_stats() {
        let repo = MockRepository::default();
        let owner = Uuid::new_v4();
        let car = repo.insert_car(sample_car(owner, 50));
        repo.insert_booking(booking_with(&car, BookingStatus::Pending, 100));

        let response = DashboardService::new(&repo)
            .insight(&owner, InsightView::Bookings, &RuleBasedInsight)
            .await
            .unwrap();

        assert_eq!(response.prompt, "Analyze bookings: 1 total. 1 pending. Advice on managing requests?");
        assert!(response.insight.contains("1 pending"));
    }
}
