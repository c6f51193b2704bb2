mod auth;
mod outage;
mod views;
mod works;
