mod codec;
mod pipeline;
mod response;
mod wake;
