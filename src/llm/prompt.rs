//! Prompt assembly for the ordering assistant.

use crate::models::ChatMessage;

const SYSTEM_PROMPT: &str = "\
Bạn là trợ lý AI thông minh chuyên hỗ trợ đặt món ăn online cho khách hàng Việt Nam.

Nhiệm vụ của bạn:
- Trả lời câu hỏi về menu món ăn một cách chính xác, chi tiết
- Hỗ trợ khách hàng đặt món, hủy món, thêm món, sửa đổi đơn đặt món
- Giải đáp thắc mắc về giá cả, còn món để đặt hay không

Ngôn ngữ:
- Sử dụng ngôn ngữ thân thiện, tự nhiên
- Tất cả câu trả lời cần viết bằng tiếng Việt
- Có thể thay đổi phong cách ngôn ngữ nếu khách hàng yêu cầu
- Tuyệt đối không sử dụng ngôn ngữ bất thô tục, khiếm nhã, xúc phạm

Nguyên tắc:
- Chỉ sử dụng thông tin có trong dữ liệu menu được cung cấp
- Nếu không có thông tin, hãy nói rõ bạn không tìm thấy
- Trả lời ngắn gọn, súc tích nhưng đầy đủ thông tin
- Không bịa đặt giá cả hay thông tin không có

Định dạng:
- Chỉ viết từ 1 đến 3 câu ngắn gọn, trao đổi đủ thông tin
- Không thêm dấu xuống dòng `\\n` trong câu trả lời
- Không viết các ký tự đặc biệt của markdown
- Câu trả lời phải là từ 1 đến 3 câu, không có định dạng đặc biệt hết, tức là một đoạn văn trơn tru đơn giản.

Lưu ý:
- Nếu khách hàng hỏi thông tin, hãy trả lời dựa trên thông tin từ thực đơn menu
- Nếu khách hàng muốn đặt món, hãy kiểm tra món đó có còn hàng trong thực đơn hay không
- Khi đặt món, hãy suy nghĩ và tính toán thành tiền, xem xét đơn giá trong thực đơn cũng như số lượng mà khách yêu cầu
- Nếu khách hàng muốn hủy món, hãy luôn đồng ý hủy món theo yêu cầu

Hãy suy nghĩ thật kỹ theo từng bước, đọc kỹ thực đơn menu, đảm bảo chất lượng câu trả lời tốt nhất và chính xác nhất
";

/// ChatML control tokens that must never reach the model from user or menu text.
const CONTROL_TOKENS: &[&str] = &["<|im_start|>", "<|im_end|>", "<|endoftext|>"];

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Remove chat-template control tokens from untrusted text.
pub fn sanitize_for_prompt(text: &str) -> String {
    let mut out = text.to_string();
    for token in CONTROL_TOKENS {
        if out.contains(token) {
            out = out.replace(token, "");
        }
    }
    out
}

/// Fill the user template. An empty context switches to the apology template.
pub fn user_prompt(query: &str, context: &str) -> String {
    let query = sanitize_for_prompt(query);
    if context.is_empty() {
        format!(
            "Câu hỏi của khách hàng: {query}\n\n\
             Xin lỗi, tôi không tìm thấy thông tin liên quan trong menu. \
             Hãy trả lời lịch sự và đề nghị khách hàng hỏi về các món khác."
        )
    } else {
        let context = sanitize_for_prompt(context);
        format!(
            "Dựa trên thông tin menu sau:\n\n\
             {context}\n\n\
             Câu hỏi của khách hàng: {query}\n\n\
             Hãy trả lời câu hỏi của khách hàng một cách chính xác và thân thiện."
        )
    }
}

/// The `[system, user]` conversation sent to the chat model.
/// `context` is cut to its first `max_context_chars` characters.
pub fn build_messages(query: &str, context: &str, max_context_chars: usize) -> Vec<ChatMessage> {
    let context = truncate_chars(context, max_context_chars);
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_prompt(query, context)),
    ]
}

/// The first `max_chars` characters of `s` (not bytes).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
