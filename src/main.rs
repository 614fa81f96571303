use autorent::{Config, build_rocket};
use rocket::{Build, Rocket};

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    dotenvy::dotenv().ok();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => panic!("Failed to load configuration: {}", err),
    };

    build_rocket(config)
}
