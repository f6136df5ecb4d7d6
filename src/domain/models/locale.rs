use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    EnumIter,
    EnumString,
    EnumVariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    Ko,
    #[default]
    En,
}

impl Locale {
    /// `ko` for any Korean language tag (`ko`, `ko-KR`, `ko_KR.UTF-8`), else `en`.
    pub fn detect(lang: &str) -> Locale {
        if lang.starts_with("ko") {
            return Locale::Ko;
        }

        return Locale::En;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display, EnumIter)]
pub enum TranslationKey {
    #[strum(serialize = "auth.title")]
    AuthTitle,
    #[strum(serialize = "auth.error")]
    AuthError,
    #[strum(serialize = "persona.myPersonas")]
    PersonaMyPersonas,
    #[strum(serialize = "persona.empty")]
    PersonaEmpty,
    #[strum(serialize = "persona.loading")]
    PersonaLoading,
    #[strum(serialize = "persona.chat")]
    PersonaChat,
    #[strum(serialize = "chat.placeholder")]
    ChatPlaceholder,
    #[strum(serialize = "chat.connecting")]
    ChatConnecting,
    #[strum(serialize = "chat.connected")]
    ChatConnected,
    #[strum(serialize = "chat.streaming")]
    ChatStreaming,
    #[strum(serialize = "chat.turnFailed")]
    ChatTurnFailed,
    #[strum(serialize = "chat.connectionLost")]
    ChatConnectionLost,
    #[strum(serialize = "sns.feed")]
    SnsFeed,
    #[strum(serialize = "sns.empty")]
    SnsEmpty,
    #[strum(serialize = "sns.likes")]
    SnsLikes,
    #[strum(serialize = "sns.comments")]
    SnsComments,
    #[strum(serialize = "activityLog.title")]
    ActivityLogTitle,
    #[strum(serialize = "activityLog.empty")]
    ActivityLogEmpty,
    #[strum(serialize = "lora.status")]
    LoraStatus,
    #[strum(serialize = "lora.trainingStarted")]
    LoraTrainingStarted,
    #[strum(serialize = "schedule.title")]
    ScheduleTitle,
    #[strum(serialize = "schedule.empty")]
    ScheduleEmpty,
    #[strum(serialize = "schedule.active")]
    ScheduleActive,
    #[strum(serialize = "schedule.inactive")]
    ScheduleInactive,
    #[strum(serialize = "image.gallery")]
    ImageGallery,
    #[strum(serialize = "image.noImages")]
    ImageNoImages,
    #[strum(serialize = "image.profile")]
    ImageProfile,
    #[strum(serialize = "common.loading")]
    CommonLoading,
    #[strum(serialize = "common.loadMore")]
    CommonLoadMore,
}

impl TranslationKey {
    pub fn ko(&self) -> &'static str {
        match self {
            TranslationKey::AuthTitle => return "Alter Ego",
            TranslationKey::AuthError => return "오류가 발생했습니다",
            TranslationKey::PersonaMyPersonas => return "내 페르소나",
            TranslationKey::PersonaEmpty => {
                return "아직 페르소나가 없습니다. 첫 번째 페르소나를 만들어보세요!"
            }
            TranslationKey::PersonaLoading => return "페르소나 로딩 중...",
            TranslationKey::PersonaChat => return "채팅",
            TranslationKey::ChatPlaceholder => return "메시지를 입력하세요...",
            TranslationKey::ChatConnecting => return "연결 중...",
            TranslationKey::ChatConnected => return "연결되었습니다",
            TranslationKey::ChatStreaming => return "응답을 기다리는 중입니다",
            TranslationKey::ChatTurnFailed => return "응답에 실패했습니다",
            TranslationKey::ChatConnectionLost => return "연결이 끊어졌습니다",
            TranslationKey::SnsFeed => return "피드",
            TranslationKey::SnsEmpty => return "아직 게시물이 없습니다",
            TranslationKey::SnsLikes => return "좋아요",
            TranslationKey::SnsComments => return "댓글",
            TranslationKey::ActivityLogTitle => return "활동 기록",
            TranslationKey::ActivityLogEmpty => return "아직 활동 기록이 없습니다",
            TranslationKey::LoraStatus => return "LoRA 상태",
            TranslationKey::LoraTrainingStarted => return "LoRA 학습을 시작했습니다",
            TranslationKey::ScheduleTitle => return "스케줄",
            TranslationKey::ScheduleEmpty => return "등록된 스케줄이 없습니다",
            TranslationKey::ScheduleActive => return "활성",
            TranslationKey::ScheduleInactive => return "비활성",
            TranslationKey::ImageGallery => return "이미지 갤러리",
            TranslationKey::ImageNoImages => return "아직 생성된 이미지가 없습니다",
            TranslationKey::ImageProfile => return "프로필",
            TranslationKey::CommonLoading => return "로딩 중...",
            TranslationKey::CommonLoadMore => return "더 보기",
        }
    }

    pub fn en(&self) -> &'static str {
        match self {
            TranslationKey::AuthTitle => return "Alter Ego",
            TranslationKey::AuthError => return "An error occurred",
            TranslationKey::PersonaMyPersonas => return "My Personas",
            TranslationKey::PersonaEmpty => return "No personas yet. Create your first one!",
            TranslationKey::PersonaLoading => return "Loading personas...",
            TranslationKey::PersonaChat => return "Chat",
            TranslationKey::ChatPlaceholder => return "Type a message...",
            TranslationKey::ChatConnecting => return "Connecting...",
            TranslationKey::ChatConnected => return "Connected",
            TranslationKey::ChatStreaming => return "Waiting for the reply to finish",
            TranslationKey::ChatTurnFailed => return "The reply failed",
            TranslationKey::ChatConnectionLost => return "Connection lost",
            TranslationKey::SnsFeed => return "Feed",
            TranslationKey::SnsEmpty => return "No posts yet",
            TranslationKey::SnsLikes => return "likes",
            TranslationKey::SnsComments => return "comments",
            TranslationKey::ActivityLogTitle => return "Activity Log",
            TranslationKey::ActivityLogEmpty => return "No activity yet",
            TranslationKey::LoraStatus => return "LoRA status",
            TranslationKey::LoraTrainingStarted => return "LoRA training started",
            TranslationKey::ScheduleTitle => return "Schedules",
            TranslationKey::ScheduleEmpty => return "No schedules yet",
            TranslationKey::ScheduleActive => return "active",
            TranslationKey::ScheduleInactive => return "paused",
            TranslationKey::ImageGallery => return "Image Gallery",
            TranslationKey::ImageNoImages => return "No images generated yet",
            TranslationKey::ImageProfile => return "profile",
            TranslationKey::CommonLoading => return "Loading...",
            TranslationKey::CommonLoadMore => return "Load more",
        }
    }

    pub fn translate(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::Ko => return self.ko(),
            Locale::En => return self.en(),
        }
    }
}
