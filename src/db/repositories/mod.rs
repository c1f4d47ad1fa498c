mod sessions;
mod temperature_logs;
mod temperatures;
