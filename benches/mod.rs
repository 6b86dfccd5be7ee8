use criterion::{criterion_group, criterion_main};

mod mqtt_client;

criterion_group!(
    benches,
    mqtt_client::bench_publish_qos0,
    mqtt_client::bench_round_trip,
    mqtt_client::bench_publish_and_receive_qos0,
    mqtt_client::bench_publish_and_receive_qos1
);
criterion_main!(benches);
