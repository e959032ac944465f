mod common;
mod judging;
