//! Static product catalog: the fixed set of product options available for each
//! routine step.

use serde::Serialize;

use super::step::{Step, UsageTime};

pub const CLEANSING_FOAM: &str = "cleansing_foam";
pub const SUNCREAM: &str = "suncream";
pub const MASK_PACK: &str = "mask_pack";

const MORNING_EVENING: &[UsageTime] = &[UsageTime::Morning, UsageTime::Evening];
const MORNING: &[UsageTime] = &[UsageTime::Morning];
const EVENING: &[UsageTime] = &[UsageTime::Evening];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProductOption {
    pub step: Step,
    pub key: &'static str,
    /// Display name; doubles as the price segment lookup key and the name
    /// matched against a user's owned cosmetics.
    pub name: &'static str,
    pub usage_time: &'static [UsageTime],
    pub frequency: u32,
    pub instructions: &'static str,
    pub minutes: u32,
}

impl ProductOption {
    pub fn sequence(&self) -> u8 {
        self.step.sequence()
    }

    pub fn used_in(&self, usage_time: UsageTime) -> bool {
        self.usage_time.contains(&usage_time)
    }
}

const fn option(
    step: Step,
    key: &'static str,
    name: &'static str,
    usage_time: &'static [UsageTime],
    frequency: u32,
    instructions: &'static str,
    minutes: u32,
) -> ProductOption {
    ProductOption { step, key, name, usage_time, frequency, instructions, minutes }
}

static CLEANSING_OPTIONS: [ProductOption; 6] = [
    option(
        Step::Cleansing,
        "cleansing_oil",
        "클렌징오일",
        EVENING,
        1,
        "1. 깨끗하게 씻은 손에 물기를 제거해 주세요!\n\
         2. 클렌징 오일을 한펌프 손에 짜서 마른 얼굴에 손가락으로 부드럽게 1분정도 마사지해줍니다\n\
         3. 손에 물을 조금 묻혀서 1분정도 살살 마사지 해주세요!\n\
         4. 미온수로 얼굴을 헹궈주세요!",
        2,
    ),
    option(
        Step::Cleansing,
        CLEANSING_FOAM,
        "클렌징폼",
        MORNING_EVENING,
        1,
        "1. 깨끗하게 씻은 손으로, 얼굴에 물을 묻혀주세요\n\
         2. 엄지손톱 크기만큼 폼클렌징을 짜서 거품을 풍성하게 내주세요!\n\
         3. 거품을 손가락으로 1분정도 살살 문질러 줍니다!\n\
         4. 미온수로 얼굴을 헹궈주세요!",
        2,
    ),
    option(
        Step::Cleansing,
        "cleansing_water",
        "클렌징워터",
        EVENING,
        1,
        "1. 화장솜에 클렌징 워터를 충분히 적셔줍니다.\n\
         2. 얼굴 전체를 화장솜으로 부드럽게 닦아냅니다.\n\
         3. 메이크업 진한 부위는 잠시 올려둔 뒤 닦아내세요.\n\
         4. 미온수로 가볍게 헹궈줍니다.",
        2,
    ),
    option(
        Step::Cleansing,
        "cleansing_milk",
        "클렌징밀크",
        EVENING,
        1,
        "1. 손에 1~2 펌프의 클렌징 밀크를 덜어냅니다.\n\
         2. 마른 얼굴에 부드럽게 마사지하듯 펴 발라줍니다.\n\
         3. 메이크업이 녹을 때까지 마사지 후, 화장솜 또는 미온수로 헹궈내세요.",
        2,
    ),
    option(
        Step::Cleansing,
        "cleansing_gel",
        "클렌징젤",
        EVENING,
        1,
        "1. 깨끗하게 씻은 손에 500원 크기 정도의 클렌징젤을 덜어냅니다.\n\
         2. 마른 얼굴에 부드럽게 손가락으로 마사지하며 메이크업을 녹여줍니다.\n\
         3. 손에 물을 묻혀 젤이 밀키한 색으로 변할 때까지 마사지합니다.\n\
         4. 미온수로 깨끗이 헹궈냅니다.",
        2,
    ),
    option(
        Step::Cleansing,
        "cleansing_balm",
        "클렌징밤",
        EVENING,
        1,
        "1. 깨끗하게 씻은 손에 500원 크기 정도의 클렌징밤을 덜어내 주세요.\n\
         2. 마른 얼굴에 부드럽게 펴 바르고 마사지하여 메이크업을 녹입니다.\n\
         3. 물을 조금 묻혀 유화 후 깨끗이 헹궈냅니다.",
        2,
    ),
];

static CLEANSING_CARE_OPTIONS: [ProductOption; 2] = [
    option(
        Step::CleansingCare,
        "scrub",
        "스크럽",
        EVENING,
        1,
        "1. 세안 후 물기 제거 없이 500원 크기 정도 스크럽을 손에 덜어냅니다.\n\
         2. 눈가 제외 얼굴 전체를 1~2분 부드럽게 문질러 각질 제거.\n\
         3. 각질 많은 부위 집중 마사지.\n\
         4. 미온수로 깨끗이 씻어냅니다.",
        2,
    ),
    option(
        Step::CleansingCare,
        "peeling",
        "필링",
        EVENING,
        1,
        "1. 세안 후 물기를 제거한 상태에서 1~2 펌프 필링제를 손에 덜어냅니다.\n\
         2. 얼굴 전체에 바르고 1~2분 후 부드럽게 문질러 각질 제거.\n\
         3. 미온수로 깨끗이 씻어냅니다.\n*주 1~2회 사용 권장*",
        2,
    ),
];

static TONER_OPTIONS: [ProductOption; 2] = [
    option(
        Step::Toner,
        "skin",
        "스킨",
        MORNING_EVENING,
        1,
        "1. 화장솜에 스킨을 충분히 적시거나, 적당량을 손에 덜어냅니다.\n\
         2. 얼굴 중앙에서 바깥쪽 방향으로 부드럽게 닦아냅니다.\n\
         3. 손바닥으로 가볍게 눌러 흡수시켜주세요.",
        1,
    ),
    option(
        Step::Toner,
        "toner",
        "토너",
        MORNING_EVENING,
        1,
        "1. 화장솜에 토너를 충분히 적시거나, 적당량을 손에 덜어냅니다.\n\
         2. 얼굴 중앙에서 바깥쪽으로 부드럽게 닦아냅니다.\n\
         3. 가볍게 두드려 흡수시켜줍니다.",
        1,
    ),
];

static CONCENTRATION_CARE_OPTIONS: [ProductOption; 3] = [
    option(
        Step::ConcentrationCare,
        "essence",
        "에센스",
        MORNING_EVENING,
        1,
        "1. 한 번 펌핑한 에센스를 손바닥에 덜어 얼굴에 부드럽게 발라주세요.\n\
         2. 손바닥으로 가볍게 눌러 흡수시켜줍니다.",
        1,
    ),
    option(
        Step::ConcentrationCare,
        "serum",
        "세럼",
        MORNING_EVENING,
        1,
        "1. 스포이드로 한 펌프 덜어 손에 놓습니다.\n\
         2. 얼굴 전체에 부드럽게 펴 바르고 톡톡 두드려 흡수시킵니다.",
        1,
    ),
    option(
        Step::ConcentrationCare,
        "ampoule",
        "앰플",
        MORNING_EVENING,
        1,
        "1. 스포이드로 한 펌프 덜어냅니다.\n\
         2. 얼굴 전체에 부드럽게 펴 바르고 톡톡 두드려 흡수시킵니다.",
        1,
    ),
];

static MOISTURIZING_OPTIONS: [ProductOption; 2] = [
    option(
        Step::Moisturizing,
        "cream",
        "크림",
        MORNING_EVENING,
        1,
        "1. 500원 크기 만큼 크림을 손등에 덜어냅니다.\n\
         2. 이마, 양 볼, 코, 턱에 점을 찍듯 바릅니다.\n\
         3. 부드럽게 펴 바른 후 손바닥으로 가볍게 눌러 흡수시킵니다.",
        1,
    ),
    option(
        Step::Moisturizing,
        "lotion",
        "로션",
        MORNING_EVENING,
        1,
        "1. 50원 동전 크기 정도 로션을 손등에 덜어냅니다.\n\
         2. 이마, 양 볼, 코, 턱에 점을 찍듯 나눠 바릅니다.\n\
         3. 손끝으로 마사지하듯 흡수시켜주세요.",
        1,
    ),
];

static SUN_CARE_OPTIONS: [ProductOption; 2] = [
    option(
        Step::SunCare,
        SUNCREAM,
        "선크림",
        MORNING,
        1,
        "1. 외출 30분 전에 사용합니다.\n\
         2. 손가락 한 마디 정도 짜서 이마, 볼, 코, 턱에 점 찍듯 바릅니다.\n\
         3. 고르게 펴 발라줍니다.",
        1,
    ),
    option(
        Step::SunCare,
        "sunstick",
        "선스틱",
        MORNING,
        1,
        "1. 얼굴이나 목에 스틱을 2~3회 문질러 균일하게 바릅니다.",
        1,
    ),
];

static SLEEPING_PACK_OPTIONS: [ProductOption; 1] = [option(
    Step::SleepingPack,
    "sleeping_pack",
    "슬리핑팩",
    EVENING,
    1,
    "1. 저녁 스킨케어 마지막 단계에서 슬리핑팩을 적당량 덜어냅니다.\n\
     2. 얼굴 전체에 부드럽게 펴 발라줍니다.\n\
     3. 다음날 아침 미온수로 가볍게 씻어내세요.",
    1,
)];

static MASK_PACK_OPTIONS: [ProductOption; 1] = [option(
    Step::MaskPack,
    MASK_PACK,
    "마스크팩",
    EVENING,
    3,
    "1. 세안 후 토너로 피부결 정돈 후 마스크팩을 붙입니다.\n\
     2. 10~20분 후 마스크를 제거합니다.\n\
     3. 남은 에센스를 톡톡 두드려 흡수시켜주세요.",
    15,
)];

/// Options for a step in catalog order.
pub fn options(step: Step) -> &'static [ProductOption] {
    match step {
        Step::Cleansing => &CLEANSING_OPTIONS,
        Step::CleansingCare => &CLEANSING_CARE_OPTIONS,
        Step::Toner => &TONER_OPTIONS,
        Step::ConcentrationCare => &CONCENTRATION_CARE_OPTIONS,
        Step::Moisturizing => &MOISTURIZING_OPTIONS,
        Step::SunCare => &SUN_CARE_OPTIONS,
        Step::SleepingPack => &SLEEPING_PACK_OPTIONS,
        Step::MaskPack => &MASK_PACK_OPTIONS,
    }
}

pub fn find(step: Step, key: &str) -> Option<&'static ProductOption> {
    options(step).iter().find(|option| option.key == key)
}

pub fn all() -> impl Iterator<Item = &'static ProductOption> {
    Step::ALL.into_iter().flat_map(options)
}
