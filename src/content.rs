//! Build-time copy for the KaiLo landing page: narrative steps, testimonials,
//! tracked sections and the user-facing messages of the lead form.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub id: u32,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub body: &'static str,
    pub media_ref: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarouselItem {
    pub id: u32,
    pub primary_text: &'static str,
    pub tag: &'static str,
    pub secondary_text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_note: Option<&'static str>,
}

// The last step is active on first render.
pub const DEFAULT_STEP_INDEX: usize = 3;

pub static STEPS: [Step; 4] = [
    Step {
        id: 1,
        title: "당연했던 정답",
        subtitle: "비우기",
        body: "질문하기 전, KaiLo는 낯설게 바라보기를 통해\n굳은 사고를 유연하게 풀어줍니다.",
        media_ref: "/images/step1_undraw_social-serenity_x9vq.svg",
        label: "정답 비우기",
    },
    Step {
        id: 2,
        title: "날카로운 질문으로",
        subtitle: "서로 흔들기",
        body: "KaiLo만의 하브루타식 문답을 통해 질문은 또 다른 질문을 낳고,\n주제를 파고드는 힘을 키웁니다.",
        media_ref: "/images/step2_undraw_solution-mindset_pit7.svg",
        label: "질문으로 흔들기",
    },
    Step {
        id: 3,
        title: "무너진 자리에서",
        subtitle: "나를 다시 세우기",
        body: "KaiLo에서는 불편했던 순간,\n관점의 전환을 통한 메타인지 과정을 기록하고 피드백합니다.",
        media_ref: "/images/step3_undraw_new-ideas_nk4n.svg",
        label: "나를 다시 세우기",
    },
    Step {
        id: 4,
        title: "생각이 삶이 되는",
        subtitle: "'작은 실행'의 시작",
        body: "\"이 생각으로 무엇을 해볼 수 있을까?\"\nKaiLo는 사유의 끝에 '작은 실행'을 설계합니다.",
        media_ref: "/images/step4_undraw_light-the-fire_u2zp.svg",
        label: "'작은 실행'의 시작",
    },
];

pub static TESTIMONIALS: [CarouselItem; 4] = [
    CarouselItem {
        id: 1,
        primary_text: "1:1 대화 코너가 예상보다 훨씬 좋았고요, 제가 가진 좁은 세계를 인식하게 되면서 관점이 확장되는 걸 느꼈어요.",
        tag: "#관점확장",
        secondary_text: "제가 저만의 작은 세계에 갇혀 있었다는 걸 알았어요.",
        optional_note: None,
    },
    CarouselItem {
        id: 2,
        primary_text: "완벽주의를 내려놓고 실행에 집중하니까, 오히려 저를 조금 더 다듬어 갈 수 있었어요. 멈췄다 가는 법을 배운 시간이었어요.",
        tag: "#실행의용기",
        secondary_text: "완벽보다 일단 실행하는 게 저를 더 다듬어준다는 걸 알았어요.",
        optional_note: None,
    },
    CarouselItem {
        id: 3,
        primary_text: "막연한 다짐보다, 실질적인 움직임이 훨씬 중요하더라고요. 과정 속의 저를 잘 돌보는 법을 배웠어요.",
        tag: "#실질적변화",
        secondary_text: "결국 변화는 실질적인 행동으로부터 온다는 걸 알았어요.",
        optional_note: None,
    },
    CarouselItem {
        id: 4,
        primary_text: "디지털 노마드 같은 도구에 매몰되지 않고, 진짜 제 방향을 잡는 법을 알게 되었어요.",
        tag: "#본질찾기",
        secondary_text: "도구보다 진짜 내 방향을 잡는 게 중요하다는 걸 알았어요.",
        optional_note: None,
    },
];

/// Regions instrumented for one-shot "viewed" telemetry, in page order.
pub const TRACKED_SECTIONS: [&str; 6] = [
    "hero",
    "problem",
    "contrast",
    "solution",
    "the-log",
    "testimonials",
];

pub const TESTIMONIALS_SECTION: &str = "testimonials";

// Lead form
pub const LEAD_SOURCE: &str = "KaiLo Landing Page";
pub const LEAD_MAGNET: &str = "AI 소크라테스: 나를 파고드는 질문 프롬프트 키트";
pub const SIGNUP_EVENT_SOURCE: &str = "landing_page";
pub const MSG_NOT_READY: &str = "서비스가 준비 중입니다. 잠시 후 다시 시도해주세요.";
pub const MSG_SUCCESS: &str = "감사합니다! 이메일을 확인해주세요.";
pub const MSG_FAILURE: &str = "오류가 발생했습니다. 다시 시도해주세요.";
pub const MSG_MISSING_EMAIL: &str = "이메일을 입력해주세요.";
pub const MSG_BUSY: &str = "신청을 처리하고 있습니다. 잠시만 기다려주세요.";

// Calls to action
pub const WAITLIST_LABEL: &str = "KaiLo 모임 대기 신청";
pub const WAITLIST_LINK: &str = "https://tally.so/r/BzKrZ7";

// Thirst section illustration
pub const THIRST_SECTION: &str = "thirst_section";
pub const THIRST_IMAGE: &str = "undraw_hacker-mind_j91b";
pub const REFLECTION_STORAGE_KEY: &str = "reflection_storage";

// Confirmation page
pub const THANKS_TITLE: &str = "KaiLo에 오신 걸 환영해요.";
pub const THANKS_LINES: [&str; 4] = [
    "당신의 생각이 궁금했습니다.",
    "조금만 기다리면 이메일로 도착해요.",
    "(스팸함도 한번 확인해주세요!)",
    "2026년엔 우리가 진짜 원하는 방향으로 :)",
];
pub const THANKS_SIGNATURE: &str = "- KaiLo";
pub const THANKS_CELEBRATION_IMAGE: &str = "/images/bill-murray-celebration.gif";
pub const THREADS_LINK: &str = "https://threads.net/@talk.kailo";
pub const THREADS_HANDLE: &str = "@talk.kailo";

pub const SITE_TITLE: &str = "KaiLo";
pub const OG_IMAGE_PATH: &str = "/images/KaiLo_로고_원_무배경.png";
