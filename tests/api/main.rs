mod dashboard;
mod login;
mod members;
