// src/extractors/prompt.rs
use crate::extractors::config::ExtractionSettings;
use crate::extractors::source::FileKind;

// Korean, so row labels come back in the language the classifier keywords use.
const PDF_PROMPT: &str = r#"이 PDF 문서에서 모든 표를 찾아 정확한 CSV 형식으로 변환해주세요.
문서가 90도 회전되어 있더라도 인식해서 표의 내용을 정확히 추출해주세요.

다음 지침을 철저히 따라주세요:
1. 문서의 모든 표를 개별적으로 추출하세요. 다음 유형을 모두 포함합니다:
   - 재무제표/재무상태표/대차대조표
   - 손익계산서
   - 현금흐름표
   - 자본변동표
   - 주요 투자지표
   - 주석사항과 부가설명이 포함된 표
   - 그 외 숫자나 데이터가 포함된 모든 표
2. 각 표의 구조와 형식을 그대로 유지하세요:
   - 연도별 칼럼 구조 유지 (2016년부터 2020년까지 등 모든 연도 포함)
   - 금액 단위(백만원, 억원 등) 표시 포함
   - 모든 항목명(매출액, 영업이익, 자산총계 등)을 원문 그대로 포함
   - 음수 값은 "-" 기호를 포함한 원래 형태로 유지
   - 비율 값은 "%" 기호를 포함한 원래 형태로 유지
3. 표 전체를 누락 없이 추출하세요:
   - 모든 행과 열이 빠짐없이 추출되어야 합니다
   - 표의 제목, 헤더, 부제목도 포함하세요
   - 표 하단의 주석이나 출처 정보도 가능하면 포함하세요
4. 각 표를 "TABLE_START"로 시작하고 "TABLE_END"로 끝내세요. 표시는 각각 한 줄에 단독으로 쓰세요.
5. 모든 필드를 큰따옴표로 감싸고, 빈 셀은 ""로 표시하세요.
6. 표가 없으면 "NO_TABLES_FOUND"라고만 응답하세요.

응답은 CSV 형식의 텍스트만 제공하고, 다른 설명이나 분석은 포함하지 마세요."#;

const IMAGE_PROMPT: &str = r#"이 이미지에서 모든 표를 찾아 정확한 CSV 형식으로 변환해주세요.
이미지가 90도 회전되어 있더라도 인식해서 표의 내용을 정확히 추출해주세요.

다음 지침을 철저히 따라주세요:
1. 이미지의 모든 표를 개별적으로 추출하세요. 다음 유형을 모두 포함합니다:
   - 재무제표/재무상태표/대차대조표 (유동자산, 비유동자산, 자산총계, 부채, 자본 등)
   - 손익계산서 (매출액, 매출원가, 판매비와관리비, 영업이익, EBITDA 등)
   - 현금흐름표 (영업활동, 투자활동, 재무활동 현금흐름 등)
   - 자본변동표
   - 주요 투자지표 (성장성, 수익성, EPS, PER, ROE 등)
   - 그 외 숫자나 데이터가 포함된 모든 표
2. 각 표의 구조와 형식을 그대로 유지하세요:
   - 연도별 칼럼 구조 유지 (표에 있는 모든 연도 포함)
   - 모든 행과 열을 누락 없이 포함 (금액, 비율, 숫자값 등)
   - 표의 원래 구조를 최대한 그대로 유지
   - 음수 값은 "-" 기호를 포함한 원래 형태로 유지
   - 괄호 안의 숫자(손실 표시)는 음수로 처리
3. 표 전체를 누락 없이 추출하세요:
   - 표 상단의 제목과 부제목도 가능하면 포함하세요
   - 표 안의 모든 구분과 항목명을 원문 그대로 포함하세요
   - 표 하단의 주석이나 출처 정보도 가능하면 포함하세요
4. 각 표를 "TABLE_START"로 시작하고 "TABLE_END"로 끝내세요. 표시는 각각 한 줄에 단독으로 쓰세요.
5. 모든 필드를 큰따옴표로 감싸고, 빈 셀은 ""로 표시하세요.
6. 표가 없으면 "NO_TABLES_FOUND"라고만 응답하세요.

응답은 CSV 형식의 텍스트만 제공하고, 다른 설명이나 분석은 포함하지 마세요.
이미지에 보이는 모든 표와 데이터를 완전하고 정확하게 추출하는 것이 가장 중요합니다."#;

/// The built-in instruction for a document kind.
pub fn default_prompt(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Pdf => PDF_PROMPT,
        FileKind::Image(_) => IMAGE_PROMPT,
    }
}

/// The prompt to send: the developer override if one is set, otherwise the
/// built-in one for `kind`.
pub fn build_prompt(kind: FileKind, settings: &ExtractionSettings) -> String {
    match settings.prompt_override() {
        Some(custom) => {
            tracing::info!("Using custom prompt ({} characters)", custom.len());
            custom.to_string()
        }
        None => default_prompt(kind).to_string(),
    }
}
