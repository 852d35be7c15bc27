mod assignment;
mod common;
