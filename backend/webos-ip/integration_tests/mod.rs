mod client;
mod error;
mod helpers;
mod pipeline;
mod wake;
