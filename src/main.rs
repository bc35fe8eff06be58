use aperture::web;

#[tokio::main]
async fn main() {
    web::run().await;
}
