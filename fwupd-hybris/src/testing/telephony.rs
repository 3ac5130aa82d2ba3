use mockall::mock;
use rstest::fixture;

use crate::telephony::ModemProbe;

mock! {
    pub ModemSource {}

    impl crate::telephony::ModemSource for ModemSource {
        fn list_modems(&self) -> ModemProbe;
    }
}

#[fixture]
pub fn mock_modem_source() -> MockModemSource {
    MockModemSource::new()
}
