use mockall::mock;
use rstest::fixture;

mock! {
    pub SensorSource {}

    impl crate::sensors::SensorSource for SensorSource {
        fn query(&self, abi: &str) -> crate::Result<String>;
    }
}

#[fixture]
pub fn mock_sensor_source() -> MockSensorSource {
    MockSensorSource::new()
}
