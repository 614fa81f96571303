use crate::database::booking::BookingRepository;
use crate::database::car::CarRepository;
use crate::database::message::MessageRepository;
use crate::database::review::ReviewRepository;
use crate::database::session::SessionRepository;
use crate::database::user::{UserRepository, hash_password};
use crate::error::app_error::AppError;
use crate::models::booking::{Booking, BookingStatus, NewBooking};
use crate::models::car::{Car, CarFilter, CarRequest, Coordinates, FuelType, Transmission};
use crate::models::message::{Message, MessageRequest};
use crate::models::reference::Reference;
use crate::models::review::{Review, ReviewRequest};
use crate::models::session::{Session, SessionUser};
use crate::models::user::{ProfileUpdateRequest, RegisterRequest, User, UserSummary};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

pub fn sample_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        phone: None,
        role: "renter".to_string(),
        password_hash: String::new(),
        created_at: Utc::now(),
    }
}

pub fn sample_car(owner_id: Uuid, price_per_day: i64) -> Car {
    Car {
        id: Uuid::new_v4(),
        owner: Some(Reference::Id(owner_id)),
        brand: "Toyota".to_string(),
        model: "Prius".to_string(),
        year: 2020,
        price_per_day,
        capacity: 5,
        transmission: Transmission::Automatic,
        fuel_type: FuelType::Hybrid,
        location: "Colombo".to_string(),
        image_url: "https://img.example.com/prius.jpg".to_string(),
        description: Some("Clean and economical".to_string()),
        available: true,
        coordinates: Coordinates { lat: 6.9271, lng: 79.8612 },
        version: 0,
        created_at: Utc::now(),
    }
}

pub fn sample_car_request() -> CarRequest {
    CarRequest {
        brand: "Nissan".to_string(),
        model: "Leaf".to_string(),
        year: 2021,
        price_per_day: 70,
        capacity: 5,
        transmission: Transmission::Automatic,
        fuel_type: FuelType::Electric,
        location: "Negombo".to_string(),
        image_url: "https://img.example.com/leaf.jpg".to_string(),
        description: None,
        lat: 7.2083,
        lng: 79.8358,
    }
}

/// Three-day booking in January 2024 priced at the car's daily rate.
pub fn sample_booking(car: &Car, renter_id: Uuid, status: BookingStatus) -> Booking {
    let owner_id = car.owner.as_ref().and_then(|owner| owner.id()).unwrap_or_else(Uuid::nil);
    Booking {
        id: Uuid::new_v4(),
        car: Reference::Id(car.id),
        user: Reference::Id(renter_id),
        owner: Reference::Id(owner_id),
        start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap(),
        total_price: car.price_per_day * 3,
        status,
        version: 0,
        created_at: Utc::now(),
    }
}

/// In-memory stand-in for Postgres. Mirrors the version guard and the
/// cascades the schema declares.
pub struct MockRepository {
    users: Mutex<Vec<User>>,
    sessions: Mutex<Vec<Session>>,
    cars: Mutex<Vec<Car>>,
    bookings: Mutex<Vec<Booking>>,
    reviews: Mutex<Vec<Review>>,
    messages: Mutex<Vec<Message>>,
    clock: Mutex<DateTime<Utc>>,
    stale_writes: AtomicBool,
}

impl Default for MockRepository {
    fn default() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
            cars: Mutex::new(Vec::new()),
            bookings: Mutex::new(Vec::new()),
            reviews: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            clock: Mutex::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()),
            stale_writes: AtomicBool::new(false),
        }
    }
}

impl MockRepository {
    pub fn insert_user(&self, user: User) -> User {
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn insert_car(&self, car: Car) -> Car {
        self.cars.lock().unwrap().push(car.clone());
        car
    }

    pub fn insert_booking(&self, booking: Booking) -> Booking {
        self.bookings.lock().unwrap().push(booking.clone());
        booking
    }

    pub fn car(&self, id: &Uuid) -> Option<Car> {
        self.cars.lock().unwrap().iter().find(|car| car.id == *id).cloned()
    }

    pub fn booking(&self, id: &Uuid) -> Option<Booking> {
        self.bookings.lock().unwrap().iter().find(|booking| booking.id == *id).cloned()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.bookings.lock().unwrap().clone()
    }

    /// Makes every version-guarded write behave as if another request won the race.
    pub fn force_stale_writes(&self) {
        self.stale_writes.store(true, Ordering::SeqCst);
    }

    fn version_matches(&self, current: i32, expected: i32) -> bool {
        !self.stale_writes.load(Ordering::SeqCst) && current == expected
    }

    /// Strictly increasing timestamps so ordering in tests is deterministic.
    fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().unwrap();
        *clock += Duration::seconds(1);
        *clock
    }
}

#[async_trait::async_trait]
impl UserRepository for MockRepository {
    async fn create_user(&self, request: &RegisterRequest) -> Result<User, AppError> {
        let user = User {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            email: request.email.to_lowercase(),
            phone: request.phone.clone(),
            role: request.role.as_str().to_string(),
            password_hash: hash_password(&request.password)?,
            created_at: Utc::now(),
        };
        Ok(self.insert_user(user))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        Ok(self.users.lock().unwrap().iter().find(|user| user.email == email).cloned())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|user| user.id == *id).cloned())
    }

    async fn update_profile(&self, id: &Uuid, request: &ProfileUpdateRequest) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|user| user.id == *id).ok_or(AppError::UserNotFound)?;
        user.username = request.username.clone();
        user.phone = request.phone.clone();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &Uuid) -> Result<(), AppError> {
        self.users.lock().unwrap().retain(|user| user.id != *id);
        self.sessions.lock().unwrap().retain(|session| session.user_id != *id);
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        Ok(self.users.lock().unwrap().len() as i64)
    }
}

#[async_trait::async_trait]
impl SessionRepository for MockRepository {
    async fn create_session(&self, user_id: &Uuid, expires_at: DateTime<Utc>) -> Result<Session, AppError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: *user_id,
            expires_at,
        };

        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|existing| existing.user_id != *user_id || existing.expires_at > now);
        sessions.push(session.clone());
        Ok(session)
    }

    async fn get_active_session_user(&self, session_id: &Uuid, user_id: &Uuid) -> Result<Option<SessionUser>, AppError> {
        let now = Utc::now();
        let active = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .any(|session| session.id == *session_id && session.user_id == *user_id && session.expires_at > now);

        if !active {
            return Ok(None);
        }

        Ok(self.users.lock().unwrap().iter().find(|user| user.id == *user_id).map(|user| SessionUser {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
        }))
    }

    async fn delete_session_if_expired(&self, session_id: &Uuid) -> Result<(), AppError> {
        let now = Utc::now();
        self.sessions
            .lock()
            .unwrap()
            .retain(|session| session.id != *session_id || session.expires_at > now);
        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), AppError> {
        self.sessions.lock().unwrap().retain(|session| session.id != *session_id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CarRepository for MockRepository {
    async fn create_car(&self, owner_id: &Uuid, request: &CarRequest) -> Result<Car, AppError> {
        let car = Car {
            id: Uuid::new_v4(),
            owner: Some(Reference::Id(*owner_id)),
            brand: request.brand.clone(),
            model: request.model.clone(),
            year: request.year,
            price_per_day: request.price_per_day,
            capacity: request.capacity,
            transmission: request.transmission,
            fuel_type: request.fuel_type,
            location: request.location.clone(),
            image_url: request.image_url.clone(),
            description: request.description.clone(),
            available: true,
            coordinates: request.coordinates(),
            version: 0,
            created_at: Utc::now(),
        };
        Ok(self.insert_car(car))
    }

    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError> {
        Ok(self.car(id))
    }

    async fn get_car_with_owner(&self, id: &Uuid) -> Result<Option<Car>, AppError> {
        let Some(mut car) = self.car(id) else {
            return Ok(None);
        };

        if let Some(owner_id) = car.owner.as_ref().and_then(|owner| owner.id())
            && let Some(owner) = self.users.lock().unwrap().iter().find(|user| user.id == owner_id)
        {
            car.owner = Some(Reference::Populated(UserSummary::from(owner)));
        }

        Ok(Some(car))
    }

    async fn list_available_cars(&self, filter: &CarFilter) -> Result<Vec<Car>, AppError> {
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_ref()
                .is_none_or(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
        };

        Ok(self
            .cars
            .lock()
            .unwrap()
            .iter()
            .filter(|car| car.available)
            .filter(|car| contains(&car.location, &filter.location) && contains(&car.brand, &filter.brand))
            .filter(|car| filter.min_price.is_none_or(|min| car.price_per_day >= min))
            .filter(|car| filter.max_price.is_none_or(|max| car.price_per_day <= max))
            .filter(|car| filter.fuel_type.is_none_or(|fuel| car.fuel_type == fuel))
            .cloned()
            .collect())
    }

    async fn list_cars_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Car>, AppError> {
        Ok(self
            .cars
            .lock()
            .unwrap()
            .iter()
            .filter(|car| car.owner.as_ref().and_then(|owner| owner.id()) == Some(*owner_id))
            .cloned()
            .collect())
    }

    async fn list_all_cars(&self) -> Result<Vec<Car>, AppError> {
        Ok(self.cars.lock().unwrap().clone())
    }

    async fn set_car_availability(&self, id: &Uuid, available: bool, expected_version: i32) -> Result<Option<Car>, AppError> {
        let mut cars = self.cars.lock().unwrap();
        let Some(car) = cars.iter_mut().find(|car| car.id == *id) else {
            return Ok(None);
        };

        if !self.version_matches(car.version, expected_version) {
            return Ok(None);
        }

        car.available = available;
        car.version += 1;
        Ok(Some(car.clone()))
    }

    async fn delete_car(&self, id: &Uuid) -> Result<(), AppError> {
        self.cars.lock().unwrap().retain(|car| car.id != *id);
        self.bookings.lock().unwrap().retain(|booking| booking.car.id() != Some(*id));
        self.reviews.lock().unwrap().retain(|review| review.car_id != *id);
        Ok(())
    }

    async fn delete_cars_by_owner(&self, owner_id: &Uuid) -> Result<u64, AppError> {
        let owned: Vec<Uuid> = self.list_cars_by_owner(owner_id).await?.iter().map(|car| car.id).collect();
        for id in &owned {
            self.delete_car(id).await?;
        }
        Ok(owned.len() as u64)
    }
}

#[async_trait::async_trait]
impl BookingRepository for MockRepository {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, AppError> {
        Ok(self.insert_booking(Booking {
            id: Uuid::new_v4(),
            car: Reference::Id(booking.car_id),
            user: Reference::Id(booking.user_id),
            owner: Reference::Id(booking.owner_id),
            start_date: booking.start_date,
            end_date: booking.end_date,
            total_price: booking.total_price,
            status: booking.status,
            version: 0,
            created_at: Utc::now(),
        }))
    }

    async fn get_booking_by_id(&self, id: &Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.booking(id))
    }

    async fn list_bookings_for_renter(&self, user_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        Ok(self.bookings().into_iter().filter(|booking| booking.user.id() == Some(*user_id)).collect())
    }

    async fn list_bookings_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        Ok(self.bookings().into_iter().filter(|booking| booking.owner.id() == Some(*owner_id)).collect())
    }

    async fn list_all_bookings(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.bookings())
    }

    async fn update_booking_status(&self, id: &Uuid, status: BookingStatus, expected_version: i32) -> Result<Option<Booking>, AppError> {
        let mut bookings = self.bookings.lock().unwrap();
        let Some(booking) = bookings.iter_mut().find(|booking| booking.id == *id) else {
            return Ok(None);
        };

        if !self.version_matches(booking.version, expected_version) {
            return Ok(None);
        }

        booking.status = status;
        booking.version += 1;
        Ok(Some(booking.clone()))
    }

    async fn has_confirmed_booking(&self, user_id: &Uuid, car_id: &Uuid) -> Result<bool, AppError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .any(|booking| booking.user.id() == Some(*user_id) && booking.car.id() == Some(*car_id) && booking.status.is_confirmed()))
    }

    async fn complete_finished_bookings(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut completed = 0;
        for booking in self.bookings.lock().unwrap().iter_mut() {
            if booking.status == BookingStatus::Approved && booking.end_date < now {
                booking.status = BookingStatus::Completed;
                booking.version += 1;
                completed += 1;
            }
        }
        Ok(completed)
    }
}

#[async_trait::async_trait]
impl ReviewRepository for MockRepository {
    async fn create_review(&self, user_id: &Uuid, request: &ReviewRequest) -> Result<Review, AppError> {
        let review = Review {
            id: Uuid::new_v4(),
            car_id: request.car_id,
            user: Reference::Id(*user_id),
            rating: request.rating,
            comment: request.comment.clone(),
            created_at: self.tick(),
        };
        self.reviews.lock().unwrap().push(review.clone());
        Ok(review)
    }

    async fn list_reviews_for_car(&self, car_id: &Uuid) -> Result<Vec<Review>, AppError> {
        let mut reviews: Vec<Review> = self.reviews.lock().unwrap().iter().filter(|review| review.car_id == *car_id).cloned().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

#[async_trait::async_trait]
impl MessageRepository for MockRepository {
    async fn create_message(&self, sender_id: &Uuid, request: &MessageRequest) -> Result<Message, AppError> {
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: *sender_id,
            receiver_id: request.receiver_id,
            content: request.content.clone(),
            created_at: self.tick(),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn list_conversation(&self, a: &Uuid, b: &Uuid, since: Option<DateTime<Utc>>) -> Result<Vec<Message>, AppError> {
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|message| {
                (message.sender_id == *a && message.receiver_id == *b) || (message.sender_id == *b && message.receiver_id == *a)
            })
            .filter(|message| since.is_none_or(|since| message.created_at > since))
            .cloned()
            .collect();
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }
}
