mod common;

mod resumes;
mod routing;
