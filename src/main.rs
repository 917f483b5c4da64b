#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    gsom_timetable::run().await
}
